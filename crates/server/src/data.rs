//! Embedded job roster and action catalogs.
//!
//! The engine never fetches data for itself; this module is the data
//! service that feeds it. Everything is compiled in, parsed once on first
//! use.

use crossbars_protocol::{Action, Job, Role};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::OnceLock;

const JOBS_JSON: &str = include_str!("../data/jobs.json");
const JOB_ACTIONS_JSON: &str = include_str!("../data/job_actions.json");
const ROLE_ACTIONS_JSON: &str = include_str!("../data/role_actions.json");

#[derive(Debug, Deserialize)]
struct JobActionSet {
    #[serde(default)]
    pve: Vec<Action>,
    #[serde(default)]
    pvp: Vec<Action>,
}

fn jobs_data() -> &'static Vec<Job> {
    static JOBS: OnceLock<Vec<Job>> = OnceLock::new();
    JOBS.get_or_init(|| serde_json::from_str(JOBS_JSON).expect("jobs.json is valid"))
}

fn job_actions_data() -> &'static HashMap<String, JobActionSet> {
    static ACTIONS: OnceLock<HashMap<String, JobActionSet>> = OnceLock::new();
    ACTIONS.get_or_init(|| serde_json::from_str(JOB_ACTIONS_JSON).expect("job_actions.json is valid"))
}

fn role_actions_data() -> &'static HashMap<String, Vec<Action>> {
    static ROLES: OnceLock<HashMap<String, Vec<Action>>> = OnceLock::new();
    ROLES.get_or_init(|| serde_json::from_str(ROLE_ACTIONS_JSON).expect("role_actions.json is valid"))
}

fn role_key(role: Role) -> &'static str {
    match role {
        Role::Tank => "tank",
        Role::Healer => "healer",
        Role::Melee => "melee",
        Role::PhysicalRanged => "physical_ranged",
        Role::MagicalRanged => "magical_ranged",
    }
}

/// Full roster, disabled jobs included.
pub fn jobs() -> &'static [Job] {
    jobs_data()
}

/// Jobs the planner accepts layouts for.
pub fn enabled_jobs() -> Vec<Job> {
    jobs().iter().filter(|j| !j.disabled).cloned().collect()
}

/// Exact-abbreviation lookup, disabled jobs included; callers decide
/// whether disabled counts as found.
pub fn find_job(abbr: &str) -> Option<&'static Job> {
    jobs().iter().find(|j| j.abbr == abbr)
}

/// Job action list plus the matching role action list. PvP mode swaps in
/// the PvP kit and the shared PvP role actions.
pub fn actions_for_job(job: &Job, is_pvp: bool) -> (Vec<Action>, Vec<Action>) {
    let sets = job_actions_data().get(&job.abbr);
    let actions = sets
        .map(|s| if is_pvp { s.pvp.clone() } else { s.pve.clone() })
        .unwrap_or_default();

    let role_actions = if is_pvp {
        role_actions_data().get("pvp").cloned().unwrap_or_default()
    } else {
        job.role
            .and_then(|role| role_actions_data().get(role_key(role)).cloned())
            .unwrap_or_default()
    };

    (actions, role_actions)
}

#[cfg(test)]
mod data_tests {
    use super::*;

    #[test]
    fn embedded_files_parse() {
        assert!(!jobs().is_empty());
        assert!(!job_actions_data().is_empty());
        assert!(!role_actions_data().is_empty());
    }

    #[test]
    fn every_enabled_job_has_actions_both_modes() {
        for job in enabled_jobs() {
            let (pve, pve_roles) = actions_for_job(&job, false);
            let (pvp, pvp_roles) = actions_for_job(&job, true);
            assert!(!pve.is_empty(), "{} has no PvE actions", job.abbr);
            assert!(!pve_roles.is_empty(), "{} has no role actions", job.abbr);
            assert!(!pvp.is_empty(), "{} has no PvP actions", job.abbr);
            assert!(!pvp_roles.is_empty(), "{} has no PvP role actions", job.abbr);
        }
    }

    #[test]
    fn find_job_is_exact_and_sees_disabled_jobs() {
        assert!(find_job("PLD").is_some());
        assert!(find_job("pld").is_none());
        assert!(find_job("XXX").is_none());
        assert!(find_job("BLU").map(|j| j.disabled).unwrap_or(false));
    }

    #[test]
    fn pvp_swaps_both_lists() {
        let job = find_job("WHM").unwrap();
        let (pve, pve_roles) = actions_for_job(job, false);
        let (pvp, pvp_roles) = actions_for_job(job, true);
        assert_ne!(pve[0].id, pvp[0].id);
        assert!(pve_roles.iter().any(|a| a.name == "Esuna"));
        assert!(pvp_roles.iter().any(|a| a.name == "Guard"));
    }
}
