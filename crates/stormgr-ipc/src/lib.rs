//! Wire transport between storage clients and plugin processes.
//!
//! Messages travel over one connected Unix stream socket as length-prefixed
//! JSON frames. A client issues one request at a time through
//! [`Transport`]; plugin sessions read requests through [`Framed`]. The
//! [`contract`] module declares the argument struct and result shape of
//! every wire method so both ends agree on what each call carries.

pub mod contract;
mod frame;
mod message;
mod transport;

pub use contract::{
    JobOr, JobProgress, Operation, PluginDescription, WireValue, decode_arguments,
    encode_arguments, ops,
};
pub use frame::{FrameError, Framed, HEADER_LEN, MAX_FRAME_BYTES, read_frame, write_frame};
pub use message::{Fault, Request, Response};
pub use transport::{CONNECT_TIMEOUT, Transport};
