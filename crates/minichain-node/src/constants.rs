pub(crate) const DEFAULT_LISTEN: &str = "127.0.0.1:8080";
pub(crate) const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";
pub(crate) const TX_ACCEPTED: &str = "Transaction added to the pool";
pub(crate) const TX_REJECTED: &str = "Invalid transaction format";
