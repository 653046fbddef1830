//! Events of the platform's event stream

use serde::{Deserialize, Serialize};
use serde_json::Value;

use core_kernel::RemoteId;

use crate::error::EventSyncError;

/// One event pulled from `ereignis.getNext`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteEvent {
    /// Sequence id within the stream; becomes the new cursor
    pub event_id: i64,
    /// Business transaction type (`Geschaeftsvorfall`)
    pub transaction_type: String,
    /// Contract the event refers to
    pub contract_id: Option<RemoteId>,
    pub partner_id: Option<RemoteId>,
    /// The event as received
    pub payload: Value,
}

impl RemoteEvent {
    /// Reads the event out of a pull result
    ///
    /// # Returns
    ///
    /// `None` when the stream has no event after the cursor
    /// (`{"Ereignis": null}`).
    ///
    /// # Errors
    ///
    /// Returns `EventSyncError::MalformedEvent` if the result or the event
    /// lacks the expected fields.
    pub fn from_result(result: Option<&Value>) -> Result<Option<Self>, EventSyncError> {
        let result = result
            .and_then(Value::as_object)
            .ok_or_else(|| EventSyncError::malformed("result is not an object"))?;
        let event = match result.get("Ereignis") {
            None => return Err(EventSyncError::malformed("Ereignis is missing")),
            Some(Value::Null) => return Ok(None),
            Some(event) => event,
        };
        let fields = event
            .as_object()
            .ok_or_else(|| EventSyncError::malformed("Ereignis is not an object"))?;

        let event_id = fields
            .get("EreignisID")
            .and_then(sequence_id)
            .ok_or_else(|| EventSyncError::malformed("EreignisID is missing or not an integer"))?;
        let transaction_type = fields
            .get("Geschaeftsvorfall")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| EventSyncError::malformed("Geschaeftsvorfall is missing"))?
            .to_string();

        Ok(Some(Self {
            event_id,
            transaction_type,
            contract_id: fields.get("VertragID").and_then(RemoteId::from_json),
            partner_id: fields.get("PartnerID").and_then(RemoteId::from_json),
            payload: event.clone(),
        }))
    }
}

fn sequence_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_no_event() {
        let result = json!({"Ereignis": null});
        assert_eq!(RemoteEvent::from_result(Some(&result)).unwrap(), None);
    }

    #[test]
    fn test_event_fields() {
        let result = json!({"Ereignis": {
            "EreignisID": "17",
            "Geschaeftsvorfall": "VERTRAG_GEKUENDIGT",
            "VertragID": 454920555,
        }});

        let event = RemoteEvent::from_result(Some(&result)).unwrap().unwrap();

        assert_eq!(event.event_id, 17);
        assert_eq!(event.transaction_type, "VERTRAG_GEKUENDIGT");
        assert_eq!(event.contract_id, Some(RemoteId::from(454920555)));
        assert_eq!(event.partner_id, None);
    }

    #[test]
    fn test_malformed_results() {
        for result in [
            json!([]),
            json!({}),
            json!({"Ereignis": 5}),
            json!({"Ereignis": {"Geschaeftsvorfall": "X"}}),
            json!({"Ereignis": {"EreignisID": 1.5, "Geschaeftsvorfall": "X"}}),
            json!({"Ereignis": {"EreignisID": 1, "Geschaeftsvorfall": " "}}),
        ] {
            let error = RemoteEvent::from_result(Some(&result)).unwrap_err();
            assert!(matches!(error, EventSyncError::MalformedEvent(_)), "{result}");
        }
        assert!(RemoteEvent::from_result(None).is_err());
    }
}
