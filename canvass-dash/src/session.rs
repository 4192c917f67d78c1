//! Per-volunteer canvassing session
//!
//! All state is in memory and lives until the session is ended or the
//! process exits. Each operation validates its input against the current
//! dataset and returns a fresh view value.

use canvass_common::precincts::{self, Precinct};
use canvass_common::{Address, Error, Result, SupportLevel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::{debug, info};
use uuid::Uuid;

use crate::dataset::Dataset;

/// Outcome of one doorstep contact
#[derive(Debug, Clone, Serialize)]
pub struct Interaction {
    pub volunteer: String,
    pub note: String,
    pub tags: BTreeSet<String>,
    pub support: SupportLevel,
    pub donation: f64,
    pub recorded_at: DateTime<Utc>,
}

/// Contact report submitted by the volunteer
#[derive(Debug, Clone, Deserialize)]
pub struct ContactReport {
    pub address_id: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub support: SupportLevel,
    #[serde(default)]
    pub donation: f64,
    /// Recorded under this name instead of the session volunteer
    pub volunteer: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CanvassSession {
    pub id: Uuid,
    pub volunteer: String,
    pub selected_precinct: Option<String>,
    pub visited: HashSet<String>,
    pub interactions: HashMap<String, Interaction>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub volunteer: String,
    pub selected_precinct: Option<String>,
    pub visited_count: usize,
    pub interaction_count: usize,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DonationTotals {
    pub total: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionStats {
    /// Selected precinct, or `None` for the whole dataset
    pub precinct: Option<Precinct>,
    pub addresses_in_scope: usize,
    pub visited: usize,
    pub coverage_pct: f64,
    pub support: BTreeMap<SupportLevel, usize>,
    pub donations: DonationTotals,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportEntry {
    pub address: Address,
    pub visited: bool,
    pub interaction: Interaction,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionExport {
    pub session: SessionSummary,
    pub exported_at: DateTime<Utc>,
    pub entries: Vec<ExportEntry>,
}

impl CanvassSession {
    pub fn new(volunteer: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            volunteer: volunteer.into(),
            selected_precinct: None,
            visited: HashSet::new(),
            interactions: HashMap::new(),
            created_at: Utc::now(),
        }
    }

    /// Restrict the session to a precinct from the static table
    pub fn select_precinct(&mut self, precinct_id: &str) -> Result<&'static Precinct> {
        let precinct = precincts::find(precinct_id)
            .ok_or_else(|| Error::NotFound(format!("precinct {}", precinct_id)))?;
        self.selected_precinct = Some(precinct.id.to_string());
        debug!(session = %self.id, precinct = precinct.id, "Precinct selected");
        Ok(precinct)
    }

    /// Mark the address visited and upsert its interaction
    pub fn record_contact(&mut self, dataset: &Dataset, report: ContactReport) -> Result<&Interaction> {
        if dataset.get(&report.address_id).is_none() {
            return Err(Error::NotFound(format!("address {}", report.address_id)));
        }
        if !report.donation.is_finite() || report.donation < 0.0 {
            return Err(Error::InvalidInput(format!(
                "donation must be a non-negative amount, got {}",
                report.donation
            )));
        }

        let volunteer = report
            .volunteer
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| self.volunteer.clone());
        let tags = report
            .tags
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        let interaction = Interaction {
            volunteer,
            note: report.note,
            tags,
            support: report.support,
            donation: report.donation,
            recorded_at: Utc::now(),
        };

        info!(
            session = %self.id,
            address = %report.address_id,
            support = ?interaction.support,
            "Contact recorded"
        );

        let id = report.address_id;
        self.visited.insert(id.clone());
        self.interactions.insert(id.clone(), interaction);
        Ok(&self.interactions[&id])
    }

    /// Toggle the visited flag; interactions are left untouched
    pub fn set_visited(&mut self, dataset: &Dataset, address_id: &str, visited: bool) -> Result<()> {
        if dataset.get(address_id).is_none() {
            return Err(Error::NotFound(format!("address {}", address_id)));
        }
        if visited {
            self.visited.insert(address_id.to_string());
        } else {
            self.visited.remove(address_id);
        }
        Ok(())
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id,
            volunteer: self.volunteer.clone(),
            selected_precinct: self.selected_precinct.clone(),
            visited_count: self.visited.len(),
            interaction_count: self.interactions.len(),
            created_at: self.created_at,
        }
    }

    /// Coverage and outcome totals for the selected precinct, or everything
    pub fn stats(&self, dataset: &Dataset) -> SessionStats {
        let scope = self.selected_precinct.as_deref();

        // Duplicate parcel ids share one visited flag, so both sides of the
        // coverage ratio count distinct ids
        let scoped_ids: HashSet<&str> = dataset
            .addresses()
            .iter()
            .filter(|a| scope.map_or(true, |p| a.precinct == p))
            .map(|a| a.id())
            .collect();
        let visited = scoped_ids
            .iter()
            .filter(|id| self.visited.contains(**id))
            .count();

        let coverage_pct = if scoped_ids.is_empty() {
            0.0
        } else {
            visited as f64 / scoped_ids.len() as f64 * 100.0
        };

        let mut support: BTreeMap<SupportLevel, usize> =
            SupportLevel::ALL.iter().map(|&level| (level, 0)).collect();
        let mut donations = DonationTotals { total: 0.0, count: 0 };
        for (id, interaction) in &self.interactions {
            if !scoped_ids.contains(id.as_str()) {
                continue;
            }
            *support.entry(interaction.support).or_default() += 1;
            if interaction.donation > 0.0 {
                donations.total += interaction.donation;
                donations.count += 1;
            }
        }

        SessionStats {
            precinct: scope.and_then(precincts::find).cloned(),
            addresses_in_scope: scoped_ids.len(),
            visited,
            coverage_pct,
            support,
            donations,
        }
    }

    /// Interactions joined with their addresses, in dataset order
    pub fn export(&self, dataset: &Dataset) -> SessionExport {
        let mut exported = HashSet::new();
        let entries = dataset
            .addresses()
            .iter()
            .filter_map(|address| {
                let interaction = self.interactions.get(address.id())?;
                if !exported.insert(address.id()) {
                    return None;
                }
                Some(ExportEntry {
                    address: address.clone(),
                    visited: self.visited.contains(address.id()),
                    interaction: interaction.clone(),
                })
            })
            .collect();

        SessionExport {
            session: self.summary(),
            exported_at: Utc::now(),
            entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{LoadOutcome, LoadedFrom, SourceKind};
    use canvass_common::AddressRecord;

    fn dataset() -> Dataset {
        let record = |parcel: &str, zip: &str, num: u32| AddressRecord {
            parcel_number: Some(parcel.to_string()),
            str_num: Some(num),
            str_name: Some("CENTRAL AVE".to_string()),
            str_zip: Some(zip.to_string()),
            ..AddressRecord::default()
        };
        Dataset::from_outcome(LoadOutcome {
            records: vec![
                record("A", "33701", 100),
                record("B", "33701", 200),
                record("C", "33701", 300),
                record("D", "33713", 100),
            ],
            loaded_from: LoadedFrom {
                kind: SourceKind::Local,
                location: "fixture".to_string(),
            },
            notices: Vec::new(),
            loaded_at: Utc::now(),
        })
    }

    fn report(address_id: &str) -> ContactReport {
        ContactReport {
            address_id: address_id.to_string(),
            note: "Friendly".to_string(),
            tags: vec!["yard sign".to_string(), " ".to_string()],
            support: SupportLevel::StrongSupport,
            donation: 25.0,
            volunteer: None,
        }
    }

    #[test]
    fn test_record_contact_marks_visited() {
        let dataset = dataset();
        let mut session = CanvassSession::new("Sam");

        let interaction = session.record_contact(&dataset, report("A")).unwrap();
        assert_eq!(interaction.volunteer, "Sam");
        assert_eq!(interaction.tags.len(), 1);
        assert!(session.visited.contains("A"));
    }

    #[test]
    fn test_record_contact_upserts() {
        let dataset = dataset();
        let mut session = CanvassSession::new("Sam");
        session.record_contact(&dataset, report("A")).unwrap();

        let mut second = report("A");
        second.support = SupportLevel::NotHome;
        second.volunteer = Some("Alex".to_string());
        session.record_contact(&dataset, second).unwrap();

        assert_eq!(session.interactions.len(), 1);
        assert_eq!(session.interactions["A"].support, SupportLevel::NotHome);
        assert_eq!(session.interactions["A"].volunteer, "Alex");
    }

    #[test]
    fn test_record_contact_rejects_bad_input() {
        let dataset = dataset();
        let mut session = CanvassSession::new("Sam");

        let unknown = session.record_contact(&dataset, report("ZZZ"));
        assert!(matches!(unknown, Err(Error::NotFound(_))));

        let mut negative = report("A");
        negative.donation = -5.0;
        assert!(matches!(session.record_contact(&dataset, negative), Err(Error::InvalidInput(_))));

        let mut nan = report("A");
        nan.donation = f64::NAN;
        assert!(matches!(session.record_contact(&dataset, nan), Err(Error::InvalidInput(_))));

        assert!(session.visited.is_empty());
    }

    #[test]
    fn test_set_visited_keeps_interaction() {
        let dataset = dataset();
        let mut session = CanvassSession::new("Sam");
        session.record_contact(&dataset, report("B")).unwrap();

        session.set_visited(&dataset, "B", false).unwrap();
        assert!(!session.visited.contains("B"));
        assert!(session.interactions.contains_key("B"));
    }

    #[test]
    fn test_select_unknown_precinct() {
        let mut session = CanvassSession::new("Sam");
        assert!(matches!(session.select_precinct("999"), Err(Error::NotFound(_))));
        assert!(session.selected_precinct.is_none());
        assert_eq!(session.select_precinct("125").unwrap().id, "125");
    }

    #[test]
    fn test_stats_coverage_for_selected_precinct() {
        let dataset = dataset();
        let mut session = CanvassSession::new("Sam");
        session.select_precinct("125").unwrap();
        session.record_contact(&dataset, report("A")).unwrap();
        session.record_contact(&dataset, report("D")).unwrap();

        // Precinct 125 holds A, B, C (33701 below 1000)
        let stats = session.stats(&dataset);
        assert_eq!(stats.addresses_in_scope, 3);
        assert_eq!(stats.visited, 1);
        assert!((stats.coverage_pct - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.support[&SupportLevel::StrongSupport], 1);
        assert_eq!(stats.donations.count, 1);
        assert_eq!(stats.precinct.unwrap().id, "125");
    }

    #[test]
    fn test_stats_duplicate_parcels_reach_full_coverage() {
        let dup = |owner: &str| AddressRecord {
            parcel_number: Some("DUP".to_string()),
            owner1: Some(owner.to_string()),
            str_num: Some(100),
            str_name: Some("CENTRAL AVE".to_string()),
            str_zip: Some("33701".to_string()),
            ..AddressRecord::default()
        };
        let dataset = Dataset::from_outcome(LoadOutcome {
            records: vec![dup("FIRST"), dup("SECOND")],
            loaded_from: LoadedFrom {
                kind: SourceKind::Local,
                location: "fixture".to_string(),
            },
            notices: Vec::new(),
            loaded_at: Utc::now(),
        });
        let mut session = CanvassSession::new("Sam");
        session.select_precinct("125").unwrap();
        session.set_visited(&dataset, "DUP", true).unwrap();

        let stats = session.stats(&dataset);
        assert_eq!(stats.addresses_in_scope, 1);
        assert_eq!(stats.visited, 1);
        assert_eq!(stats.coverage_pct, 100.0);
    }

    #[test]
    fn test_stats_empty_scope_has_zero_coverage() {
        let dataset = dataset();
        let mut session = CanvassSession::new("Sam");
        session.select_precinct("111").unwrap();
        let stats = session.stats(&dataset);
        assert_eq!(stats.addresses_in_scope, 0);
        assert_eq!(stats.coverage_pct, 0.0);
    }

    #[test]
    fn test_export_joins_addresses() {
        let dataset = dataset();
        let mut session = CanvassSession::new("Sam");
        session.record_contact(&dataset, report("C")).unwrap();
        session.record_contact(&dataset, report("A")).unwrap();

        let export = session.export(&dataset);
        let ids: Vec<_> = export.entries.iter().map(|e| e.address.id()).collect();
        assert_eq!(ids, vec!["A", "C"]);
        assert!(export.entries.iter().all(|e| e.visited));
    }
}
