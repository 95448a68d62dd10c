use ledger_core::{
    constants::{GENESIS_PREVIOUS_HASH, REWARD_SENDER},
    to_canonical_string, Ledger, ProofOfWork,
};

fn mine_round(ledger: &mut Ledger, miner: &ProofOfWork, id: &str) {
    // The miner only sees the block as JSON, the way it arrives over HTTP.
    let wire = serde_json::to_string(ledger.last_block().unwrap()).unwrap();
    let fetched: serde_json::Value = serde_json::from_str(&wire).unwrap();
    assert_eq!(
        to_canonical_string(&fetched).unwrap(),
        ledger.last_block().unwrap().canonical_string().unwrap()
    );
    let proof = miner.find_proof(&to_canonical_string(&fetched).unwrap()).unwrap();
    assert!(ledger.submit_proof(proof, id).unwrap().is_some());
}

#[test]
fn remote_style_mining_builds_a_linked_chain() {
    let mut ledger = Ledger::new();
    let miner = ProofOfWork::miner_default();

    ledger.queue_transaction("alice", "bob", 3).unwrap();
    mine_round(&mut ledger, &miner, "m1");
    ledger.queue_transaction("bob", "carol", 1).unwrap();
    mine_round(&mut ledger, &miner, "m2");

    let chain = ledger.chain();
    assert_eq!(chain.len(), 3);
    assert_eq!(chain[0].previous_hash, GENESIS_PREVIOUS_HASH);
    for i in 1..chain.len() {
        assert_eq!(chain[i].previous_hash, chain[i - 1].hash().unwrap());
    }

    // Block 3 carries the reward for block 2 followed by the user transaction.
    let txs = &chain[2].transactions;
    assert_eq!(txs[0].sender, REWARD_SENDER);
    assert_eq!(txs[0].recipient, "m1");
    assert_eq!(txs[1].sender, "bob");
    assert_eq!(ledger.pending()[0].recipient, "m2");
    assert!(ledger.verify_chain().unwrap());
}

#[test]
fn block_json_round_trip_preserves_hash() {
    let mut ledger = Ledger::new();
    ledger.queue_transaction("Zoë", "Ω", 42).unwrap();
    let block = ledger.forge_block(9, None).unwrap();
    let json = serde_json::to_string(&block).unwrap();
    let back: ledger_core::Block = serde_json::from_str(&json).unwrap();
    assert_eq!(back.hash().unwrap(), block.hash().unwrap());
}
