//! This module provides builders for the Kubernetes objects synthesized by the restore actions.
pub mod container;
pub mod security;
