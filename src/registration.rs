//! Maps an authenticated caller to a User record with a role
use super::context::TxContext;
use super::error::{LedgerError, LedgerResult};
use super::keys;
use super::repository::Repository;
use super::store::LedgerStore;
use super::types::{Role, User};

/// Registers the transaction's caller under `role`.
///
/// Fails with `AlreadyRegistered` when the caller already has a User record and
/// with `InvalidRole` when `role` is not one of `admin`, `shop`, `customer`.
pub fn register<S: LedgerStore>(ctx: &mut TxContext<'_, S>, role: &str) -> LedgerResult<User> {
    let identity = ctx.caller_identity().to_string();
    if identity.is_empty() {
        return Err(LedgerError::InvalidArgument("caller identity is empty".into()));
    }

    if ctx.exists(&keys::user_key(&identity))? {
        return Err(LedgerError::AlreadyRegistered(identity));
    }
    let role: Role = role.parse()?;

    let user = User::new(identity, role);
    ctx.put(&user)?;
    Ok(user)
}
