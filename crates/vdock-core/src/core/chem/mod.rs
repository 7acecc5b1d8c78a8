//! Native chemistry algorithms backing the docking pipeline.
//!
//! The pipeline consumes these through narrow, purpose-specific functions:
//! descriptor parsing ([`smiles`], [`inchi`]), canonical serialization
//! ([`canonical`]), structural validation ([`sanitize`]), seeded 3D
//! embedding ([`embed`]), geometry refinement ([`minimize`]), and
//! template-based bond order recovery ([`template`]).

pub mod canonical;
pub mod embed;
pub mod inchi;
pub mod minimize;
pub mod sanitize;
pub mod smiles;
pub mod template;
