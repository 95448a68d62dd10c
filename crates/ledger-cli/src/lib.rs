pub mod miner;

pub const DEFAULT_NODE_URL: &str = "http://localhost:5000";
pub const DEFAULT_ID_FILE: &str = "my_id.txt";
