pub const DEFAULT_LISTEN: &str = "0.0.0.0:5000";
pub const HELLO: &str = "Hello! Welcome to blockchain server!!!";
