//! Cross-module tests: routing, persistence, broadcast, motion and the
//! assembled fabric.

mod backpressure;
mod broadcast;
mod fabric;
mod motion;
mod rotation;
mod routing;
mod support;
