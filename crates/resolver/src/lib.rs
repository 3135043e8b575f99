//! CNAME Resolvers - implementations of the resolution capability
//!
//! Two interchangeable backends for [`CnameResolver`]:
//! - [`DnsCnameResolver`]: native async DNS client (trust-dns)
//! - [`DigCnameResolver`]: the `dig` command-line utility
//!
//! Both are single-shot and carry their own per-lookup deadline.

mod dig;
mod dns;

pub use dig::DigCnameResolver;
pub use dns::DnsCnameResolver;
pub use subsnipe_common::CnameResolver;
