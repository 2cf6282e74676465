//! Walks a web photo album item by item, pressing the viewer's download
//! button and waiting for the download oracle to confirm each file before
//! moving on.

pub mod cdp;
pub mod driver;
pub mod info;
pub mod machine;
pub mod oracle;
pub mod page;
pub mod remote_log;
