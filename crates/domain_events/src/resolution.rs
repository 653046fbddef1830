//! Mapping events to local products

use core_kernel::PortError;
use domain_mandate::{Product, ProductPort};

use crate::event::RemoteEvent;

/// Local object type named when an event's contract is unknown
pub const PRODUCT_OBJECT_TYPE: &str = "Product";

/// Outcome of resolving an event's local object
#[derive(Debug, Clone, PartialEq)]
pub enum EntityResolution {
    Found(Product),
    /// No local object carries the referenced remote id
    Missing { object_type: &'static str },
}

/// Finds the product the event's `VertragID` belongs to
pub async fn resolve_product(
    products: &dyn ProductPort,
    event: &RemoteEvent,
) -> Result<EntityResolution, PortError> {
    let Some(contract_id) = event.contract_id.as_ref() else {
        return Ok(EntityResolution::Missing {
            object_type: PRODUCT_OBJECT_TYPE,
        });
    };
    Ok(match products.find_by_remote_id(contract_id).await? {
        Some(product) => EntityResolution::Found(product),
        None => EntityResolution::Missing {
            object_type: PRODUCT_OBJECT_TYPE,
        },
    })
}
