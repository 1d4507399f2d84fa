//! # Bucket Layout
//!
//! `{kind}/{node_id}/{period_start:020}.{sm|sig}`. Periods are zero-padded so
//! lexical and numeric order agree.

use shared_types::{ConsensusTimestamp, NodeId, StreamKind};

use super::entities::ObjectType;

/// Object key of one exported object.
pub fn object_key(
    kind: StreamKind,
    node_id: NodeId,
    period: ConsensusTimestamp,
    object: ObjectType,
) -> String {
    format!(
        "{}/{}/{:020}.{}",
        kind.as_str(),
        node_id,
        period,
        object.extension()
    )
}

/// Parse the final path component of an object key.
pub fn parse_object_name(name: &str) -> Option<(ConsensusTimestamp, ObjectType)> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let object = ObjectType::from_extension(ext)?;
    let period = stem.parse().ok()?;
    Some((period, object))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key_format() {
        assert_eq!(
            object_key(StreamKind::Balance, 3, 1_700_000_000_000_000_000, ObjectType::Signature),
            "balance/3/01700000000000000000.sig"
        );
    }

    #[test]
    fn test_parse_object_name() {
        assert_eq!(
            parse_object_name("00000000000000000042.sm"),
            Some((42, ObjectType::Data))
        );
        assert_eq!(parse_object_name("42.sig"), Some((42, ObjectType::Signature)));
        assert_eq!(parse_object_name("42.tmp"), None);
        assert_eq!(parse_object_name("abc.sm"), None);
        assert_eq!(parse_object_name(".sm"), None);
        assert_eq!(parse_object_name("sm"), None);
    }
}
