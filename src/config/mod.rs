//! Configuration tables: target addresses, target params, notifications,
//! community mappings, proxy entries, and notification filters.

mod arena;
mod filter;
mod rows;
mod store;

pub use arena::{Arena, RowHandle};
pub use filter::{FilterAction, FilterSubtree, NotifyFilterTable};
pub use rows::{
    CommunityRow, NotifyKind, NotifyRow, ProxyRow, RowStatus, StorageType, TagList, TagValue,
    TargetAddrRow, TargetParamsRow, TransportDomain,
};
pub use store::{TargetStore, TrapDestination, TrapSecurity, DEFAULT_RETRIES, DEFAULT_TIMEOUT};
