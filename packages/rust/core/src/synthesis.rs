//! Outline synthesis: one [`OutlineRecord`] per cluster group.
//!
//! A pure, total transform over a [`ClusterSnapshot`]. The outline template
//! is fixed and parameterized only by the group's representative keyword
//! (the first keyword in input order), so identical snapshots yield
//! byte-identical records. Timestamps belong to the caller at persistence
//! time.

use keywordforge_shared::{ClusterSnapshot, KeywordForgeError, OutlineRecord, Result};

/// Build one outline record per group, in ascending label order.
///
/// Returns [`KeywordForgeError::EmptySnapshot`] when the snapshot has no
/// groups; the caller should tell the user to run clustering first.
pub fn synthesize(snapshot: &ClusterSnapshot) -> Result<Vec<OutlineRecord>> {
    if snapshot.groups.is_empty() {
        return Err(KeywordForgeError::empty_snapshot(
            "cluster snapshot has no groups",
        ));
    }

    let mut records = Vec::with_capacity(snapshot.groups.len());
    for (label, keywords) in &snapshot.groups {
        let topic = keywords.first().ok_or_else(|| {
            KeywordForgeError::validation(format!("group {label} has no keywords"))
        })?;

        records.push(OutlineRecord {
            group_summary: keywords.join(", "),
            idea: post_idea(topic),
            outline_body: outline_body(topic),
        });
    }

    Ok(records)
}

/// The fixed five-section outline, parameterized by `topic`.
fn outline_body(topic: &str) -> String {
    format!(
        "1. Introduction — Why {topic} matters\n\
         2. Key Benefits of {topic}\n\
         3. Common Challenges\n\
         4. Best Practices\n\
         5. Conclusion — Next Steps"
    )
}

/// The one-line post idea, parameterized by `topic`.
fn post_idea(topic: &str) -> String {
    format!("Create a blog post titled: 'Mastering {topic} — The Complete Guide'")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn snapshot(groups: &[(u32, &[&str])]) -> ClusterSnapshot {
        ClusterSnapshot {
            groups: groups
                .iter()
                .map(|(label, kws)| (*label, kws.iter().map(|s| s.to_string()).collect()))
                .collect(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn one_record_per_group_in_label_order() {
        let snap = snapshot(&[(1, &["ppc"]), (0, &["seo", "sem"])]);
        let records = synthesize(&snap).expect("synthesize");
        assert_eq!(records.len(), 2);
        // BTreeMap iteration puts label 0 first
        assert_eq!(records[0].group_summary, "seo, sem");
        assert_eq!(records[1].group_summary, "ppc");
    }

    #[test]
    fn topic_is_the_first_keyword() {
        let snap = snapshot(&[(0, &["seo", "ppc"])]);
        let records = synthesize(&snap).expect("synthesize");
        assert_eq!(records[0].group_summary, "seo, ppc");
        assert!(records[0].idea.contains("seo"));
        assert!(!records[0].idea.contains("ppc"));
        assert!(records[0].outline_body.contains("Why seo matters"));
        assert!(records[0].outline_body.contains("Key Benefits of seo"));
    }

    #[test]
    fn outline_has_five_sections() {
        let snap = snapshot(&[(0, &["crm"])]);
        let records = synthesize(&snap).expect("synthesize");
        assert_eq!(records[0].outline_body.lines().count(), 5);
        assert!(records[0].outline_body.starts_with("1. Introduction"));
        assert!(records[0].outline_body.ends_with("5. Conclusion — Next Steps"));
    }

    #[test]
    fn synthesis_is_byte_identical_across_runs() {
        let snap = snapshot(&[(0, &["seo", "ppc"]), (1, &["espresso"])]);
        let a = synthesize(&snap).expect("first");
        let b = synthesize(&snap).expect("second");
        assert_eq!(a, b);
    }

    #[test]
    fn empty_snapshot_is_rejected() {
        let snap = snapshot(&[]);
        let err = synthesize(&snap).expect_err("should reject");
        assert!(matches!(err, KeywordForgeError::EmptySnapshot { .. }));
    }
}
