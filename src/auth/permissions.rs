use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ViewOwnProfile,
    EditOwnProfile,
    RecordOwnDrills,
    ManageOwnNotes,
    ViewLeaderboards,

    ViewAllUsers,
    RecordDrillsForOthers,
    ManageEvaluations,

    CreateUsers,
    EditUsers,
    DeleteUsers,
    EditSessionResults,
    ManageData,
}

/// Effective role of an account, derived from its `is_admin` / `is_evaluator` flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Trainee,
    Evaluator,
    Admin,
}

static TRAINEE_PERMISSIONS: Lazy<HashSet<Permission>> = Lazy::new(|| {
    let mut permissions = HashSet::new();

    permissions.insert(Permission::ViewOwnProfile);
    permissions.insert(Permission::EditOwnProfile);
    permissions.insert(Permission::RecordOwnDrills);
    permissions.insert(Permission::ManageOwnNotes);
    permissions.insert(Permission::ViewLeaderboards);

    permissions
});

static EVALUATOR_PERMISSIONS: Lazy<HashSet<Permission>> = Lazy::new(|| {
    let mut permissions = HashSet::new();

    permissions.extend(TRAINEE_PERMISSIONS.iter().copied());

    permissions.insert(Permission::ViewAllUsers);
    permissions.insert(Permission::RecordDrillsForOthers);
    permissions.insert(Permission::ManageEvaluations);

    permissions
});

static ADMIN_PERMISSIONS: Lazy<HashSet<Permission>> = Lazy::new(|| {
    let mut permissions = HashSet::new();

    permissions.extend(TRAINEE_PERMISSIONS.iter().copied());

    permissions.insert(Permission::ViewAllUsers);
    permissions.insert(Permission::CreateUsers);
    permissions.insert(Permission::EditUsers);
    permissions.insert(Permission::DeleteUsers);
    permissions.insert(Permission::EditSessionResults);
    permissions.insert(Permission::ManageData);

    permissions
});

static ADMIN_EVALUATOR_PERMISSIONS: Lazy<HashSet<Permission>> = Lazy::new(|| {
    ADMIN_PERMISSIONS
        .union(&EVALUATOR_PERMISSIONS)
        .copied()
        .collect()
});

impl Role {
    pub fn from_flags(is_admin: bool, is_evaluator: bool) -> Self {
        match (is_admin, is_evaluator) {
            (true, _) => Role::Admin,
            (false, true) => Role::Evaluator,
            (false, false) => Role::Trainee,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Trainee => "trainee",
            Role::Evaluator => "evaluator",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The admin and evaluator flags are independent: an admin without the
/// evaluator flag cannot record drills for others or write evaluations.
pub fn permissions_for(is_admin: bool, is_evaluator: bool) -> &'static HashSet<Permission> {
    match (is_admin, is_evaluator) {
        (true, true) => &ADMIN_EVALUATOR_PERMISSIONS,
        (true, false) => &ADMIN_PERMISSIONS,
        (false, true) => &EVALUATOR_PERMISSIONS,
        (false, false) => &TRAINEE_PERMISSIONS,
    }
}
