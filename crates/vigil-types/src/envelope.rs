use serde::{Deserialize, Serialize};

use crate::{now_timestamp, ReplicaId, RequestNumber, Sequence};

/// A single wire envelope.
///
/// Every control-plane and application-plane message is one of these: a
/// sender identifier, a timestamp, and a [`Body`] whose `message` tag
/// selects the kind-specific fields (§6 "Wire format"). This is the single
/// envelope type every component sends and receives through `vigil-wire`,
/// replacing the per-file `create_message`/ad-hoc dict construction the
/// original prototype repeated in every component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Sender identifier (a replica id, `"LFD1"`-style id, `"GFD"`, `"RM"`,
    /// or a client id).
    pub component_id: String,
    /// Local wall-clock timestamp, `YYYY-MM-DD HH:MM:SS`.
    pub timestamp: String,
    /// The kind-specific payload.
    #[serde(flatten)]
    pub body: Body,
}

impl Envelope {
    /// Builds an envelope stamped with the current time.
    pub fn new(component_id: impl Into<String>, body: Body) -> Self {
        Self {
            component_id: component_id.into(),
            timestamp: now_timestamp(),
            body,
        }
    }

    /// The kind tag, for logging (mirrors the original's `print_log`
    /// "message" field).
    pub fn kind_name(&self) -> &'static str {
        self.body.kind_name()
    }
}

/// `message_data` payload carried by `add replica` / `remove replica`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicaRef {
    pub server_id: ReplicaId,
}

/// The closed catalog of envelope kinds (§6). Internally tagged on the
/// `message` field so the wire representation stays a flat JSON object with
/// a `"message"` string key, matching the original protocol byte-for-byte
/// while giving every component a single typed enum to match on instead of
/// string comparisons against `message.get("message")`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "message")]
pub enum Body {
    // -- registration / liveness --------------------------------------
    #[serde(rename = "register")]
    Register {
        #[serde(skip_serializing_if = "Option::is_none")]
        member_count: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        checkpoint: Option<u64>,
    },
    #[serde(rename = "heartbeat")]
    Heartbeat,
    #[serde(rename = "heartbeat acknowledgment")]
    HeartbeatAck,

    // -- LFD -> GFD membership events ----------------------------------
    #[serde(rename = "add replica")]
    AddReplica { message_data: ReplicaRef },
    #[serde(rename = "remove replica")]
    RemoveReplica { message_data: ReplicaRef },

    // -- GFD -> RM -------------------------------------------------------
    #[serde(rename = "update_membership")]
    UpdateMembership {
        member_count: u32,
        server_id: ReplicaId,
    },

    // -- RM -> GFD -> LFD control directives -----------------------------
    #[serde(rename = "recover_server")]
    RecoverServer { server_id: ReplicaId },
    #[serde(rename = "new_primary")]
    NewPrimary { server_id: ReplicaId },
    #[serde(rename = "new_reliable")]
    NewReliable { server_id: ReplicaId },

    // -- RM -> Client (passive mode) -------------------------------------
    #[serde(rename = "primary_server")]
    PrimaryServer { primary_server: ReplicaId },

    // -- peer state sync (both modes) ------------------------------------
    #[serde(rename = "request_state")]
    RequestState,
    #[serde(rename = "state_response")]
    StateResponse { state: i64 },

    // -- passive checkpoint protocol --------------------------------------
    #[serde(rename = "checkpoint")]
    Checkpoint {
        state: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        sequence: Option<Sequence>,
    },
    #[serde(rename = "checkpoint_acknowledgment")]
    CheckpointAck,

    // -- client operations -------------------------------------------------
    #[serde(rename = "increase")]
    Increase { request_number: RequestNumber },
    #[serde(rename = "decrease")]
    Decrease { request_number: RequestNumber },
    #[serde(rename = "update")]
    Update { request_number: RequestNumber },
    #[serde(rename = "ping")]
    Ping { request_number: RequestNumber },
    #[serde(rename = "exit")]
    Exit,

    // -- client replies ------------------------------------------------------
    #[serde(rename = "state increased")]
    StateIncreased { state: i64, request_number: RequestNumber },
    #[serde(rename = "state decreased")]
    StateDecreased { state: i64, request_number: RequestNumber },
    #[serde(rename = "state updated")]
    StateUpdated { state: i64, request_number: RequestNumber },
    #[serde(rename = "pong")]
    Pong { request_number: RequestNumber },

    /// Anything outside the catalog above. A protocol error per §7: logged
    /// and dropped, never fatal.
    #[serde(other)]
    Unknown,
}

impl Body {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Body::Register { .. } => "register",
            Body::Heartbeat => "heartbeat",
            Body::HeartbeatAck => "heartbeat acknowledgment",
            Body::AddReplica { .. } => "add replica",
            Body::RemoveReplica { .. } => "remove replica",
            Body::UpdateMembership { .. } => "update_membership",
            Body::RecoverServer { .. } => "recover_server",
            Body::NewPrimary { .. } => "new_primary",
            Body::NewReliable { .. } => "new_reliable",
            Body::PrimaryServer { .. } => "primary_server",
            Body::RequestState => "request_state",
            Body::StateResponse { .. } => "state_response",
            Body::Checkpoint { .. } => "checkpoint",
            Body::CheckpointAck => "checkpoint_acknowledgment",
            Body::Increase { .. } => "increase",
            Body::Decrease { .. } => "decrease",
            Body::Update { .. } => "update",
            Body::Ping { .. } => "ping",
            Body::Exit => "exit",
            Body::StateIncreased { .. } => "state increased",
            Body::StateDecreased { .. } => "state decreased",
            Body::StateUpdated { .. } => "state updated",
            Body::Pong { .. } => "pong",
            Body::Unknown => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    /// Every kind in the catalog (§6) round-trips through JSON and carries
    /// its own `message` tag, the way `kind_name` names it.
    #[test_case(Body::Register { member_count: None, checkpoint: None }; "register")]
    #[test_case(Body::Register { member_count: Some(3), checkpoint: Some(5) }; "register_with_optionals")]
    #[test_case(Body::Heartbeat; "heartbeat")]
    #[test_case(Body::HeartbeatAck; "heartbeat_ack")]
    #[test_case(Body::AddReplica { message_data: ReplicaRef { server_id: ReplicaId::new(1) } }; "add_replica")]
    #[test_case(Body::RemoveReplica { message_data: ReplicaRef { server_id: ReplicaId::new(2) } }; "remove_replica")]
    #[test_case(Body::UpdateMembership { member_count: 3, server_id: ReplicaId::new(1) }; "update_membership")]
    #[test_case(Body::RecoverServer { server_id: ReplicaId::new(2) }; "recover_server")]
    #[test_case(Body::NewPrimary { server_id: ReplicaId::new(1) }; "new_primary")]
    #[test_case(Body::NewReliable { server_id: ReplicaId::new(1) }; "new_reliable")]
    #[test_case(Body::PrimaryServer { primary_server: ReplicaId::new(2) }; "primary_server")]
    #[test_case(Body::RequestState; "request_state")]
    #[test_case(Body::StateResponse { state: 7 }; "state_response")]
    #[test_case(Body::Checkpoint { state: 5, sequence: Some(3) }; "checkpoint_with_sequence")]
    #[test_case(Body::Checkpoint { state: 5, sequence: None }; "checkpoint_without_sequence")]
    #[test_case(Body::CheckpointAck; "checkpoint_acknowledgment")]
    #[test_case(Body::Increase { request_number: 1 }; "increase")]
    #[test_case(Body::Decrease { request_number: 1 }; "decrease")]
    #[test_case(Body::Update { request_number: 1 }; "update")]
    #[test_case(Body::Ping { request_number: 1 }; "ping")]
    #[test_case(Body::Exit; "exit")]
    #[test_case(Body::StateIncreased { state: 1, request_number: 1 }; "state_increased")]
    #[test_case(Body::StateDecreased { state: 1, request_number: 1 }; "state_decreased")]
    #[test_case(Body::StateUpdated { state: 7, request_number: 42 }; "state_updated")]
    #[test_case(Body::Pong { request_number: 1 }; "pong")]
    fn envelope_roundtrips_through_json(body: Body) {
        let expected_tag = body.kind_name();
        let env = Envelope::new("S1", body);

        let json = serde_json::to_string(&env).unwrap();
        assert!(json.contains(&format!("\"message\":\"{expected_tag}\"")));

        let back: Envelope = serde_json::from_str(&json).unwrap();
        assert_eq!(back, env);
    }

    #[test]
    fn unrecognized_kind_decodes_as_unknown() {
        let json = r#"{"component_id":"X","timestamp":"2026-01-01 00:00:00","message":"frobnicate"}"#;
        let env: Envelope = serde_json::from_str(json).unwrap();
        assert_eq!(env.body, Body::Unknown);
    }

    #[test]
    fn register_omits_absent_optional_fields() {
        let env = Envelope::new(
            "S1",
            Body::Register {
                member_count: None,
                checkpoint: None,
            },
        );
        let json = serde_json::to_string(&env).unwrap();
        assert!(!json.contains("member_count"));
        assert!(!json.contains("checkpoint"));
    }

    #[test]
    fn kind_name_matches_wire_tag() {
        assert_eq!(Body::Heartbeat.kind_name(), "heartbeat");
        assert_eq!(
            Body::PrimaryServer {
                primary_server: ReplicaId::new(2)
            }
            .kind_name(),
            "primary_server"
        );
    }
}
