//! Module providing the sparse metabolite/reaction network and the locked reactions.

pub mod locks;
pub mod metabolite;
pub mod sparse;
