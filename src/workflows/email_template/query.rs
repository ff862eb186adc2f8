use super::payload::{ScalarId, TemplatePayload};
use serde::{Deserialize, Serialize};

const TEST_MODE_SQL: &str = "SELECT * \
FROM zoe_ai_email_template_round_version \
WHERE id = ? \
  AND status = 0 \
  AND del_flag = 0 \
ORDER BY create_time DESC \
LIMIT 1";

const LIVE_SQL: &str = "SELECT * \
FROM zoe_ai_email_template_round_version \
WHERE id = ( \
  SELECT current_version_id \
  FROM zoe_ai_email_template_round \
  WHERE template_id = ? \
    AND round_order = ? \
    AND round_type = 0 \
    AND del_time = 0 \
) \
  AND status = 1 \
  AND del_flag = 0";

/// Parameterized template-version lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateQuery {
    pub sql: String,
    pub params: Vec<ScalarId>,
}

/// Newest draft version by id; `None` when the trigger carries no
/// `emailTemplateRoundVersionId`.
pub fn test_mode_query(payload: &TemplatePayload) -> Option<TemplateQuery> {
    let version_id = payload.email_template_round_version_id.clone()?;
    Some(TemplateQuery {
        sql: TEST_MODE_SQL.to_string(),
        params: vec![version_id],
    })
}

/// Published version of round `seq` of template `emailTemplateId`.
pub fn live_query(payload: &TemplatePayload) -> Option<TemplateQuery> {
    let template_id = payload.email_template_id.clone()?;
    let seq = payload.seq.clone()?;
    Some(TemplateQuery {
        sql: LIVE_SQL.to_string(),
        params: vec![template_id, seq],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_binds_version_id() {
        let payload = TemplatePayload {
            email_template_round_version_id: Some(ScalarId::Int(42)),
            ..Default::default()
        };
        let query = test_mode_query(&payload).unwrap();
        assert!(query.sql.contains("status = 0"));
        assert!(query.sql.contains("LIMIT 1"));
        assert_eq!(query.params, vec![ScalarId::Int(42)]);
        assert_eq!(query.sql.matches('?').count(), 1);

        assert!(test_mode_query(&TemplatePayload::default()).is_none());
    }

    #[test]
    fn live_binds_template_and_round() {
        let payload = TemplatePayload {
            email_template_id: Some(ScalarId::Text("7".into())),
            seq: Some(ScalarId::Int(1)),
            ..Default::default()
        };
        let query = live_query(&payload).unwrap();
        assert!(query.sql.contains("current_version_id"));
        assert!(query.sql.contains("round_type = 0"));
        assert_eq!(query.sql.matches('?').count(), 2);
        assert_eq!(query.params, vec![ScalarId::Text("7".into()), ScalarId::Int(1)]);

        let missing_seq = TemplatePayload {
            email_template_id: Some(ScalarId::Int(7)),
            ..Default::default()
        };
        assert!(live_query(&missing_seq).is_none());
    }
}
