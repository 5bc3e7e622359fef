use substrate_core::hash::ContentHash;
use substrate_core::store::NodeStore;
use substrate_core::{Result, SubstrateError};

/// Runs `lookup <hex-content-hash>`, printing the matching id or
/// `"not found"`.
pub fn run<S: NodeStore>(store: &S, hex: &str) -> Result<()> {
    let hash = ContentHash::from_hex(hex)
        .ok_or_else(|| SubstrateError::InvalidInput(format!("{hex:?} is not a 64-character hex hash")))?;

    match store.lookup_by_hash(hash)? {
        Some(id) => println!("{id}"),
        None => println!("not found"),
    }
    Ok(())
}
