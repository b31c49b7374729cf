pub mod fetch;
pub mod init;
pub mod map;
pub mod pack;
pub mod scan;
