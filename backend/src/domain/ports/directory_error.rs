//! Error shared by the read side of the remote directories.

use super::define_port_error;

define_port_error! {
    /// Failures reaching a customer or room directory.
    ///
    /// A missing record is not an error; lookups return `Ok(None)`.
    pub enum DirectoryError {
        /// The directory could not be reached or answered with a server error.
        Unavailable { message: String } =>
            "directory unavailable: {message}",
        /// The directory did not answer within the configured bound.
        Timeout { message: String } =>
            "directory timed out: {message}",
        /// The directory answered with a payload that could not be read.
        Decode { message: String } =>
            "directory response could not be decoded: {message}",
    }
}
