// Signature validation

use crate::descriptor::MethodSignature;
use crate::error::{ListenError, Result};

/// Check that `method`, declared on `interface`, returns no value.
pub fn validate(interface: &str, method: &MethodSignature) -> Result<()> {
    if method.returns.is_unit() {
        Ok(())
    } else {
        Err(ListenError::NonVoidReturn {
            interface: interface.to_string(),
            method: method.name.clone(),
        })
    }
}
