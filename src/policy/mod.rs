use thiserror::Error;
use uuid::Uuid;

/// Resource actions dispatched by the router. `List` and `Retrieve` are the
/// safe (non-mutating) actions; everything else writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    List,
    Create,
    Retrieve,
    Update,
    PartialUpdate,
    Destroy,
}

impl Action {
    pub fn is_safe(self) -> bool {
        matches!(self, Action::List | Action::Retrieve)
    }
}

/// The identity making a request: an authenticated user or nobody.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    Anonymous,
    User { id: Uuid, username: String },
}

impl Principal {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Principal::User { .. })
    }

    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Principal::Anonymous => None,
            Principal::User { id, .. } => Some(*id),
        }
    }
}

/// Everything a check needs to decide, passed explicitly. Collection-level
/// actions (list, create) carry no target owner; object-level actions carry
/// the owner of the record being touched.
#[derive(Debug, Clone)]
pub struct AccessContext {
    pub action: Action,
    pub principal: Principal,
    pub target_owner: Option<Uuid>,
}

impl AccessContext {
    pub fn collection(action: Action, principal: Principal) -> Self {
        Self { action, principal, target_owner: None }
    }

    pub fn object(action: Action, principal: Principal, owner: Uuid) -> Self {
        Self { action, principal, target_owner: Some(owner) }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// Principal not identified but the action requires one (HTTP 401).
    #[error("authentication credentials were not provided")]
    Authentication,
    /// Principal identified but lacks permission (HTTP 403).
    #[error("you do not have permission to perform this action")]
    Authorization,
}

/// A single permission check. Checks are pure functions of the context;
/// all checks returned by [`permissions_for`] must pass for the request
/// to proceed.
pub trait AccessCheck: Sync {
    fn is_satisfied(&self, ctx: &AccessContext) -> Result<(), PolicyError>;
}

/// Passes only for safe actions, no matter who is asking. Guards `retrieve`
/// so that the detail endpoint can never be widened into a write path.
pub struct ReadOnly;

impl AccessCheck for ReadOnly {
    fn is_satisfied(&self, ctx: &AccessContext) -> Result<(), PolicyError> {
        if ctx.action.is_safe() {
            Ok(())
        } else {
            Err(PolicyError::Authorization)
        }
    }
}

/// Safe actions pass unconditionally. Unsafe actions require an
/// authenticated principal, and when a target object exists, that principal
/// must be its owner. Create has no target yet, so only authentication is
/// checked; ownership is established by [`owner_on_create`].
pub struct OwnerOrReadOnly;

impl AccessCheck for OwnerOrReadOnly {
    fn is_satisfied(&self, ctx: &AccessContext) -> Result<(), PolicyError> {
        if ctx.action.is_safe() {
            return Ok(());
        }
        let user_id = ctx.principal.user_id().ok_or(PolicyError::Authentication)?;
        match ctx.target_owner {
            None => Ok(()),
            Some(owner) if owner == user_id => Ok(()),
            Some(_) => Err(PolicyError::Authorization),
        }
    }
}

static READ_ONLY: ReadOnly = ReadOnly;
static OWNER_OR_READ_ONLY: OwnerOrReadOnly = OwnerOrReadOnly;

static RETRIEVE_CHECKS: [&dyn AccessCheck; 1] = [&READ_ONLY];
static DEFAULT_CHECKS: [&dyn AccessCheck; 1] = [&OWNER_OR_READ_ONLY];

/// The action-to-checks table for the cat resource. Retrieve is gated by
/// `ReadOnly`; every other action by `OwnerOrReadOnly`.
pub fn permissions_for(action: Action) -> &'static [&'static dyn AccessCheck] {
    match action {
        Action::Retrieve => &RETRIEVE_CHECKS,
        _ => &DEFAULT_CHECKS,
    }
}

/// Evaluate every check for the context's action; the first failure wins.
pub fn authorize(ctx: &AccessContext) -> Result<(), PolicyError> {
    for check in permissions_for(ctx.action) {
        check.is_satisfied(ctx)?;
    }
    Ok(())
}

/// Owner attribution on create: the authenticated principal becomes the
/// owner of the new record. Runs after the create permission check, so an
/// anonymous principal here is a caller bug rather than a user error, but
/// it is still rejected rather than trusted.
pub fn owner_on_create(principal: &Principal) -> Result<Uuid, PolicyError> {
    principal.user_id().ok_or(PolicyError::Authentication)
}
