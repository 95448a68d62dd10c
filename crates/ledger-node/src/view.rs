//! Plain HTML rendering of the chain shown after a local mine.

use ledger_core::Block;
use std::fmt::Write;

pub fn render_chain(chain: &[Block], newest: &Block) -> String {
    let mut out = String::with_capacity(512 + chain.len() * 256);
    out.push_str("<!doctype html><html><head><title>Blockchain</title></head><body>");
    let _ = write!(
        out,
        "<h2>New block {} forged with proof {}</h2><p>Chain length: {}</p>",
        newest.index,
        newest.proof,
        chain.len()
    );
    out.push_str(
        "<table border=\"1\"><tr><th>Index</th><th>Timestamp</th><th>Proof</th>\
         <th>Previous hash</th><th>Transactions</th></tr>",
    );
    for block in chain {
        let class = if block.index == newest.index {
            " class=\"newest\""
        } else {
            ""
        };
        let _ = write!(
            out,
            "<tr{class}><td>{}</td><td>{}</td><td>{}</td><td><code>{}</code></td><td>",
            block.index,
            block.timestamp,
            block.proof,
            escape(&block.previous_hash)
        );
        if block.transactions.is_empty() {
            out.push_str("&mdash;");
        } else {
            out.push_str("<ul>");
            for tx in &block.transactions {
                let _ = write!(
                    out,
                    "<li>{} &rarr; {}: {}</li>",
                    escape(&tx.sender),
                    escape(&tx.recipient),
                    tx.amount
                );
            }
            out.push_str("</ul>");
        }
        out.push_str("</td></tr>");
    }
    out.push_str("</table></body></html>");
    out
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
