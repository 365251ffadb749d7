use std::collections::HashMap;

use parking_lot::Mutex;
use sesman_provider::ProviderError;

/// Operation names used for fault injection and call counting.
pub mod ops {
    pub const VERIFY_ACCESS: &str = "verify_access";
    pub const LIST_TEMPLATE_NAMES: &str = "list_template_names";
    pub const GET_TEMPLATE: &str = "get_template";
    pub const CREATE_TEMPLATE: &str = "create_template";
    pub const UPDATE_TEMPLATE: &str = "update_template";
    pub const DELETE_TEMPLATE: &str = "delete_template";
    pub const SEND_EMAIL: &str = "send_email";
    pub const LIST_CONTACT_LIST_NAMES: &str = "list_contact_list_names";
    pub const GET_CONTACT_LIST: &str = "get_contact_list";
    pub const CREATE_CONTACT_LIST: &str = "create_contact_list";
    pub const UPDATE_CONTACT_LIST: &str = "update_contact_list";
    pub const DELETE_CONTACT_LIST: &str = "delete_contact_list";
    pub const LIST_KEYS: &str = "list_keys";
    pub const GET_OBJECT: &str = "get_object";
    pub const PUT_OBJECT: &str = "put_object";
    pub const DELETE_OBJECT: &str = "delete_object";
}

#[derive(Debug, Clone)]
struct Fault {
    error: ProviderError,
    /// Calls to let through before failing.
    skip: usize,
    /// Remaining failures; `None` fails forever.
    remaining: Option<usize>,
}

/// Per-operation fault injection and call counting.
#[derive(Debug, Default)]
pub struct Faults {
    faults: Mutex<HashMap<String, Fault>>,
    calls: Mutex<HashMap<String, usize>>,
}

impl Faults {
    /// Make every following call of `operation` fail with `error`.
    pub fn fail(&self, operation: &str, error: ProviderError) {
        self.faults.lock().insert(
            operation.to_owned(),
            Fault {
                error,
                skip: 0,
                remaining: None,
            },
        );
    }

    /// Make only the next call of `operation` fail with `error`.
    pub fn fail_once(&self, operation: &str, error: ProviderError) {
        self.faults.lock().insert(
            operation.to_owned(),
            Fault {
                error,
                skip: 0,
                remaining: Some(1),
            },
        );
    }

    /// Make only the `nth` following call (1-based) of `operation` fail.
    pub fn fail_nth(&self, operation: &str, nth: usize, error: ProviderError) {
        self.faults.lock().insert(
            operation.to_owned(),
            Fault {
                error,
                skip: nth.saturating_sub(1),
                remaining: Some(1),
            },
        );
    }

    /// Remove every injected fault.
    pub fn heal(&self) {
        self.faults.lock().clear();
    }

    /// How many times `operation` has been called.
    pub fn calls(&self, operation: &str) -> usize {
        self.calls.lock().get(operation).copied().unwrap_or(0)
    }

    /// Record a call of `operation` and return the injected error, if any.
    pub(crate) fn check(&self, operation: &str) -> Result<(), ProviderError> {
        *self.calls.lock().entry(operation.to_owned()).or_default() += 1;

        let mut faults = self.faults.lock();
        let Some(fault) = faults.get_mut(operation) else {
            return Ok(());
        };
        if fault.skip > 0 {
            fault.skip -= 1;
            return Ok(());
        }
        let error = fault.error.clone();
        match &mut fault.remaining {
            Some(1) => {
                faults.remove(operation);
            }
            Some(n) => *n -= 1,
            None => {}
        }
        Err(error)
    }
}
