// Replicated Growable Array (RGA) engine for a peer-to-peer text editor
// Each character carries a globally unique position identifier derived from
// a vector clock; replicas converge for any delivery order of operations.

pub mod cell;
pub mod op;
pub mod pid;
pub mod rga;
pub mod vclock;

pub use {
    cell::Cell,
    op::{canonical_json, DeleteOp, DeleteOpId, InsertOp, RemoteOp},
    pid::Pid,
    rga::{EditError, Rga},
    vclock::VectorClock,
};
