use serde::{Deserialize, Serialize};

use crate::record::Signal;

/// User-entered substring filters. Blank criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    pub city: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub frequency: String,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        [&self.city, &self.kind, &self.frequency]
            .iter()
            .all(|c| c.trim().is_empty())
    }

    pub fn matches(&self, signal: &Signal) -> bool {
        contains_folded(&signal.city, &self.city)
            && contains_folded(&signal.kind, &self.kind)
            && contains_folded(&signal.frequency_text(), &self.frequency)
    }
}

fn contains_folded(haystack: &str, needle: &str) -> bool {
    let needle = needle.trim();
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Keeps the records matching every non-blank criterion, in input order.
pub fn filter<'a>(records: &'a [Signal], criteria: &FilterCriteria) -> Vec<&'a Signal> {
    records.iter().filter(|s| criteria.matches(s)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal(city: &str, kind: &str, frequency: Option<f64>) -> Signal {
        Signal {
            city: city.into(),
            kind: kind.into(),
            frequency,
            ..Default::default()
        }
    }

    #[test]
    fn empty_criteria_is_identity() {
        let records = vec![
            signal("Prague", "DMR", Some(439.1)),
            signal("", "", None),
            signal("Brno", "fm", Some(145.5)),
        ];
        let kept = filter(&records, &FilterCriteria::default());
        assert_eq!(kept.len(), records.len());
        assert!(kept.iter().zip(records.iter()).all(|(a, b)| std::ptr::eq(*a, b)));
    }

    #[test]
    fn city_match_is_case_insensitive_substring() {
        let criteria = FilterCriteria {
            city: "prague".into(),
            ..Default::default()
        };
        assert!(criteria.matches(&signal("Prague", "", None)));
        assert!(criteria.matches(&signal("Prague 6", "", None)));
        assert!(!criteria.matches(&signal("Brno", "", None)));
    }

    #[test]
    fn criteria_are_anded() {
        let records = vec![
            signal("Prague", "DMR", Some(439.1)),
            signal("Prague", "NFM", Some(145.5)),
            signal("Brno", "DMR", Some(439.3)),
        ];
        let criteria = FilterCriteria {
            city: "pra".into(),
            kind: "dmr".into(),
            frequency: "439".into(),
        };
        let kept = filter(&records, &criteria);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].kind, "DMR");
    }

    #[test]
    fn missing_fields_match_only_blank_criteria() {
        let bare = signal("", "", None);
        let criteria = FilterCriteria {
            frequency: "1".into(),
            ..Default::default()
        };
        assert!(!criteria.matches(&bare));
        assert!(FilterCriteria::default().matches(&bare));
    }
}
