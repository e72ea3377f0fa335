//! Reverse TCP tunnel client. Maintains a pool of outbound connections
//! to a tunnel server and, when told to, bridges one to a local origin
//! service.

pub mod args;
pub mod pooled_worker;
pub mod supervisor;
