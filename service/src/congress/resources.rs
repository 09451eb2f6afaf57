//! Static table of upstream resources.
//!
//! Each entry fully describes one tool: where it lives upstream, which
//! parameters it accepts and how they are validated, how its response is
//! unwrapped and deduplicated, and which timeout band it gets.

use serde::{Deserialize, Serialize};

use super::response::Envelope;
use super::validate::CHAMBERS;

/// Resource groups that can be switched on or off as a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolGroup {
    Bills,
    Amendments,
    Members,
    Committees,
    Nominations,
    Treaties,
    Communications,
    Hearings,
    Records,
    Votes,
    Summaries,
    Congresses,
}

impl ToolGroup {
    pub const ALL: [Self; 12] = [
        Self::Bills,
        Self::Amendments,
        Self::Members,
        Self::Committees,
        Self::Nominations,
        Self::Treaties,
        Self::Communications,
        Self::Hearings,
        Self::Records,
        Self::Votes,
        Self::Summaries,
        Self::Congresses,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bills => "bills",
            Self::Amendments => "amendments",
            Self::Members => "members",
            Self::Committees => "committees",
            Self::Nominations => "nominations",
            Self::Treaties => "treaties",
            Self::Communications => "communications",
            Self::Hearings => "hearings",
            Self::Records => "records",
            Self::Votes => "votes",
            Self::Summaries => "summaries",
            Self::Congresses => "congresses",
        }
    }

    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|group| group.as_str().eq_ignore_ascii_case(name))
    }
}

/// Timeout band. Durations come from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutClass {
    Standard,
    /// Endpoints known to respond slowly, such as historical record lookups.
    Extended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Path,
    Query,
}

/// How a parameter is validated and rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Congress,
    Chamber(&'static [&'static str]),
    /// `max: None` means the current calendar year.
    Year { min: i64, max: Option<i64> },
    Month,
    /// Checked against the `year` and `month` parameters of the same call.
    Day,
    Enum(&'static [&'static str]),
    PositiveInteger,
    Identifier,
    Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    pub location: Location,
    pub description: &'static str,
}

impl ParamSpec {
    const fn path(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: true,
            location: Location::Path,
            description,
        }
    }

    const fn query(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: false,
            location: Location::Query,
            description,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ResourceDef {
    /// Tool name.
    pub name: &'static str,
    /// Heading used when formatting results.
    pub title: &'static str,
    pub group: ToolGroup,
    pub description: &'static str,
    /// Path template; `{param}` segments are filled from path parameters.
    pub path: &'static str,
    pub params: &'static [ParamSpec],
    pub collection_key: &'static str,
    pub item_key: Option<&'static str>,
    /// Fields (dotted paths allowed) that identify a record.
    pub dedup_keys: &'static [&'static str],
    pub timeout: TimeoutClass,
    /// Whether upstream honours `offset`/`limit` for this endpoint.
    pub upstream_paging: bool,
    /// Set for single-record lookups; names the record type in NotFound errors.
    pub lookup: Option<&'static str>,
    /// Fields shown per record in formatted output.
    pub summary_fields: &'static [&'static str],
}

impl ResourceDef {
    #[must_use]
    pub const fn envelope(&self) -> Envelope<'static> {
        Envelope {
            collection: self.collection_key,
            item: self.item_key,
        }
    }

    #[must_use]
    pub fn param(&self, name: &str) -> Option<&'static ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }
}

pub const BILL_TYPES: &[&str] = &[
    "hr", "s", "hjres", "sjres", "hconres", "sconres", "hres", "sres",
];
pub const AMENDMENT_TYPES: &[&str] = &["hamdt", "samdt", "suamdt"];
pub const REPORT_TYPES: &[&str] = &["hrpt", "srpt", "erpt"];
pub const HOUSE_COMMUNICATION_TYPES: &[&str] = &["ec", "ml", "pm", "pt"];
pub const SENATE_COMMUNICATION_TYPES: &[&str] = &["ec", "pm", "pom"];
pub const SORT_ORDERS: &[&str] = &["updateDate+asc", "updateDate+desc"];

/// Years covered by the bound Congressional Record.
pub const BOUND_RECORD_YEARS: (i64, i64) = (1873, 1997);

const CONGRESS: ParamSpec = ParamSpec::path("congress", ParamKind::Congress, "Congress number, e.g. 117");
const BILL_TYPE: ParamSpec = ParamSpec::path(
    "billType",
    ParamKind::Enum(BILL_TYPES),
    "Bill type: hr, s, hjres, sjres, hconres, sconres, hres or sres",
);
const BILL_NUMBER: ParamSpec =
    ParamSpec::path("billNumber", ParamKind::PositiveInteger, "Bill number, e.g. 3076");
const FROM_DATE_TIME: ParamSpec = ParamSpec::query(
    "fromDateTime",
    ParamKind::Timestamp,
    "Only records updated at or after this UTC timestamp (YYYY-MM-DDTHH:MM:SSZ)",
);
const TO_DATE_TIME: ParamSpec = ParamSpec::query(
    "toDateTime",
    ParamKind::Timestamp,
    "Only records updated at or before this UTC timestamp (YYYY-MM-DDTHH:MM:SSZ)",
);
const SORT: ParamSpec = ParamSpec::query(
    "sort",
    ParamKind::Enum(SORT_ORDERS),
    "Sort order: updateDate+asc or updateDate+desc",
);

const BILL_FIELDS: &[&str] = &[
    "type",
    "number",
    "title",
    "latestAction.actionDate",
    "latestAction.text",
];

pub static RESOURCES: &[ResourceDef] = &[
    ResourceDef {
        name: "list_bills",
        title: "Bills",
        group: ToolGroup::Bills,
        description: "List bills introduced in a congress, most recently updated first.",
        path: "/bill/{congress}",
        params: &[CONGRESS, FROM_DATE_TIME, TO_DATE_TIME, SORT],
        collection_key: "bills",
        item_key: None,
        dedup_keys: &["congress", "type", "number"],
        timeout: TimeoutClass::Standard,
        upstream_paging: true,
        lookup: None,
        summary_fields: BILL_FIELDS,
    },
    ResourceDef {
        name: "list_bills_by_type",
        title: "Bills by type",
        group: ToolGroup::Bills,
        description: "List bills of one type (hr, s, hjres, ...) in a congress.",
        path: "/bill/{congress}/{billType}",
        params: &[CONGRESS, BILL_TYPE, FROM_DATE_TIME, TO_DATE_TIME, SORT],
        collection_key: "bills",
        item_key: None,
        dedup_keys: &["congress", "type", "number"],
        timeout: TimeoutClass::Standard,
        upstream_paging: true,
        lookup: None,
        summary_fields: BILL_FIELDS,
    },
    ResourceDef {
        name: "get_bill",
        title: "Bill",
        group: ToolGroup::Bills,
        description: "Fetch one bill by congress, type and number.",
        path: "/bill/{congress}/{billType}/{billNumber}",
        params: &[CONGRESS, BILL_TYPE, BILL_NUMBER],
        collection_key: "bills",
        item_key: Some("bill"),
        dedup_keys: &["congress", "type", "number"],
        timeout: TimeoutClass::Standard,
        upstream_paging: false,
        lookup: Some("bill"),
        summary_fields: &[
            "type",
            "number",
            "title",
            "introducedDate",
            "sponsors",
            "policyArea.name",
            "latestAction.actionDate",
            "latestAction.text",
        ],
    },
    ResourceDef {
        name: "get_bill_actions",
        title: "Bill actions",
        group: ToolGroup::Bills,
        description: "List the actions taken on a bill.",
        path: "/bill/{congress}/{billType}/{billNumber}/actions",
        params: &[CONGRESS, BILL_TYPE, BILL_NUMBER],
        collection_key: "actions",
        item_key: None,
        dedup_keys: &["actionDate", "actionCode", "text"],
        timeout: TimeoutClass::Standard,
        upstream_paging: true,
        lookup: None,
        summary_fields: &["actionDate", "type", "text"],
    },
    ResourceDef {
        name: "get_bill_cosponsors",
        title: "Bill cosponsors",
        group: ToolGroup::Bills,
        description: "List the cosponsors of a bill.",
        path: "/bill/{congress}/{billType}/{billNumber}/cosponsors",
        params: &[CONGRESS, BILL_TYPE, BILL_NUMBER],
        collection_key: "cosponsors",
        item_key: None,
        dedup_keys: &["bioguideId"],
        timeout: TimeoutClass::Standard,
        upstream_paging: true,
        lookup: None,
        summary_fields: &["fullName", "party", "state", "sponsorshipDate"],
    },
    ResourceDef {
        name: "list_amendments",
        title: "Amendments",
        group: ToolGroup::Amendments,
        description: "List amendments of one type (hamdt, samdt, suamdt) in a congress.",
        path: "/amendment/{congress}/{amendmentType}",
        params: &[
            CONGRESS,
            ParamSpec::path(
                "amendmentType",
                ParamKind::Enum(AMENDMENT_TYPES),
                "Amendment type: hamdt, samdt or suamdt",
            ),
            FROM_DATE_TIME,
            TO_DATE_TIME,
        ],
        collection_key: "amendments",
        item_key: None,
        dedup_keys: &["congress", "type", "number"],
        timeout: TimeoutClass::Standard,
        upstream_paging: true,
        lookup: None,
        summary_fields: &[
            "type",
            "number",
            "purpose",
            "latestAction.actionDate",
            "latestAction.text",
        ],
    },
    ResourceDef {
        name: "list_members",
        title: "Members",
        group: ToolGroup::Members,
        description: "List members who served in a congress.",
        path: "/member/congress/{congress}",
        params: &[
            CONGRESS,
            ParamSpec::query(
                "currentMember",
                ParamKind::Enum(&["true", "false"]),
                "Restrict to members currently serving",
            ),
        ],
        collection_key: "members",
        item_key: None,
        dedup_keys: &["bioguideId"],
        timeout: TimeoutClass::Standard,
        upstream_paging: true,
        lookup: None,
        summary_fields: &["name", "partyName", "state", "district", "bioguideId"],
    },
    ResourceDef {
        name: "get_member",
        title: "Member",
        group: ToolGroup::Members,
        description: "Fetch one member by Bioguide ID.",
        path: "/member/{bioguideId}",
        params: &[ParamSpec::path(
            "bioguideId",
            ParamKind::Identifier,
            "Bioguide identifier, e.g. A000360",
        )],
        collection_key: "members",
        item_key: Some("member"),
        dedup_keys: &["bioguideId"],
        timeout: TimeoutClass::Standard,
        upstream_paging: false,
        lookup: Some("member"),
        summary_fields: &[
            "directOrderName",
            "partyHistory",
            "state",
            "birthYear",
            "currentMember",
            "officialWebsiteUrl",
        ],
    },
    ResourceDef {
        name: "list_committees",
        title: "Committees",
        group: ToolGroup::Committees,
        description: "List committees of a chamber.",
        path: "/committee/{chamber}",
        params: &[ParamSpec::path(
            "chamber",
            ParamKind::Chamber(CHAMBERS),
            "Chamber: house, senate or joint",
        )],
        collection_key: "committees",
        item_key: None,
        dedup_keys: &["systemCode"],
        timeout: TimeoutClass::Standard,
        upstream_paging: true,
        lookup: None,
        summary_fields: &["name", "chamber", "committeeTypeCode", "systemCode"],
    },
    ResourceDef {
        name: "list_committee_reports",
        title: "Committee reports",
        group: ToolGroup::Committees,
        description: "List committee reports of one type (hrpt, srpt, erpt) in a congress.",
        path: "/committee-report/{congress}/{reportType}",
        params: &[
            CONGRESS,
            ParamSpec::path(
                "reportType",
                ParamKind::Enum(REPORT_TYPES),
                "Report type: hrpt, srpt or erpt",
            ),
        ],
        collection_key: "reports",
        item_key: None,
        dedup_keys: &["citation"],
        timeout: TimeoutClass::Standard,
        upstream_paging: true,
        lookup: None,
        summary_fields: &["citation", "chamber", "updateDate"],
    },
    ResourceDef {
        name: "list_nominations",
        title: "Nominations",
        group: ToolGroup::Nominations,
        description: "List presidential nominations received in a congress.",
        path: "/nomination/{congress}",
        params: &[CONGRESS],
        collection_key: "nominations",
        item_key: None,
        dedup_keys: &["congress", "number", "partNumber"],
        timeout: TimeoutClass::Standard,
        upstream_paging: true,
        lookup: None,
        summary_fields: &[
            "citation",
            "description",
            "receivedDate",
            "latestAction.text",
        ],
    },
    ResourceDef {
        name: "list_treaties",
        title: "Treaties",
        group: ToolGroup::Treaties,
        description: "List treaties received in a congress.",
        path: "/treaty/{congress}",
        params: &[CONGRESS],
        collection_key: "treaties",
        item_key: None,
        dedup_keys: &["congressReceived", "number", "suffix"],
        timeout: TimeoutClass::Standard,
        upstream_paging: true,
        lookup: None,
        summary_fields: &["number", "suffix", "topic", "transmittedDate"],
    },
    ResourceDef {
        name: "list_house_communications",
        title: "House communications",
        group: ToolGroup::Communications,
        description: "List House communications of one type (ec, ml, pm, pt) in a congress.",
        path: "/house-communication/{congress}/{communicationType}",
        params: &[
            CONGRESS,
            ParamSpec::path(
                "communicationType",
                ParamKind::Enum(HOUSE_COMMUNICATION_TYPES),
                "Communication type: ec, ml, pm or pt",
            ),
        ],
        collection_key: "houseCommunications",
        item_key: None,
        dedup_keys: &["congress", "number", "communicationType.code"],
        timeout: TimeoutClass::Standard,
        upstream_paging: true,
        lookup: None,
        summary_fields: &["communicationType.name", "number", "chamber", "updateDate"],
    },
    ResourceDef {
        name: "list_senate_communications",
        title: "Senate communications",
        group: ToolGroup::Communications,
        description: "List Senate communications of one type (ec, pm, pom) in a congress.",
        path: "/senate-communication/{congress}/{communicationType}",
        params: &[
            CONGRESS,
            ParamSpec::path(
                "communicationType",
                ParamKind::Enum(SENATE_COMMUNICATION_TYPES),
                "Communication type: ec, pm or pom",
            ),
        ],
        collection_key: "senateCommunications",
        item_key: None,
        dedup_keys: &["congress", "number", "communicationType.code"],
        timeout: TimeoutClass::Standard,
        upstream_paging: true,
        lookup: None,
        summary_fields: &["communicationType.name", "number", "chamber", "updateDate"],
    },
    ResourceDef {
        name: "list_hearings",
        title: "Hearings",
        group: ToolGroup::Hearings,
        description: "List published committee hearings for a chamber in a congress.",
        path: "/hearing/{congress}/{chamber}",
        params: &[
            CONGRESS,
            ParamSpec::path(
                "chamber",
                ParamKind::Chamber(&["house", "senate"]),
                "Chamber: house or senate",
            ),
        ],
        collection_key: "hearings",
        item_key: None,
        dedup_keys: &["jacketNumber", "chamber", "part"],
        timeout: TimeoutClass::Standard,
        upstream_paging: true,
        lookup: None,
        summary_fields: &["jacketNumber", "chamber", "number", "part", "updateDate"],
    },
    ResourceDef {
        name: "list_daily_congressional_record",
        title: "Daily Congressional Record issues",
        group: ToolGroup::Records,
        description: "List daily Congressional Record issues in a volume.",
        path: "/daily-congressional-record/{volumeNumber}",
        params: &[ParamSpec::path(
            "volumeNumber",
            ParamKind::PositiveInteger,
            "Congressional Record volume number, e.g. 168",
        )],
        collection_key: "dailyCongressionalRecord",
        item_key: None,
        dedup_keys: &["volumeNumber", "issueNumber"],
        timeout: TimeoutClass::Standard,
        upstream_paging: true,
        lookup: None,
        summary_fields: &["issueDate", "volumeNumber", "issueNumber", "congress"],
    },
    ResourceDef {
        name: "get_bound_congressional_record",
        title: "Bound Congressional Record",
        group: ToolGroup::Records,
        description: "Fetch bound Congressional Record entries for a date between 1873 and 1997.",
        path: "/bound-congressional-record/{year}/{month}/{day}",
        params: &[
            ParamSpec::path(
                "year",
                ParamKind::Year {
                    min: BOUND_RECORD_YEARS.0,
                    max: Some(BOUND_RECORD_YEARS.1),
                },
                "Year, 1873 through 1997",
            ),
            ParamSpec::path("month", ParamKind::Month, "Month, 1 through 12"),
            ParamSpec::path("day", ParamKind::Day, "Day of the month"),
        ],
        collection_key: "boundCongressionalRecord",
        item_key: None,
        dedup_keys: &["date", "volumeNumber", "sessionNumber"],
        timeout: TimeoutClass::Extended,
        upstream_paging: true,
        lookup: None,
        summary_fields: &["date", "congress", "sessionNumber", "volumeNumber"],
    },
    ResourceDef {
        name: "list_house_votes",
        title: "House roll call votes",
        group: ToolGroup::Votes,
        description: "List House roll call votes for a session of a congress.",
        path: "/house-vote/{congress}/{session}",
        params: &[
            CONGRESS,
            ParamSpec::path("session", ParamKind::Enum(&["1", "2"]), "Session: 1 or 2"),
        ],
        collection_key: "houseRollCallVotes",
        item_key: None,
        dedup_keys: &["congress", "sessionNumber", "rollCallNumber"],
        timeout: TimeoutClass::Standard,
        upstream_paging: true,
        lookup: None,
        summary_fields: &[
            "rollCallNumber",
            "startDate",
            "legislationType",
            "legislationNumber",
            "result",
        ],
    },
    ResourceDef {
        name: "list_summaries",
        title: "Bill summaries",
        group: ToolGroup::Summaries,
        description: "List CRS bill summaries for a bill type in a congress.",
        path: "/summaries/{congress}/{billType}",
        params: &[CONGRESS, BILL_TYPE, FROM_DATE_TIME, TO_DATE_TIME, SORT],
        collection_key: "summaries",
        item_key: None,
        dedup_keys: &["bill.congress", "bill.type", "bill.number", "versionCode"],
        timeout: TimeoutClass::Standard,
        upstream_paging: true,
        lookup: None,
        summary_fields: &[
            "bill.type",
            "bill.number",
            "bill.title",
            "actionDesc",
            "actionDate",
        ],
    },
    ResourceDef {
        name: "get_congress",
        title: "Congress",
        group: ToolGroup::Congresses,
        description: "Fetch one congress with its sessions and dates.",
        path: "/congress/{congress}",
        params: &[CONGRESS],
        collection_key: "congresses",
        item_key: Some("congress"),
        dedup_keys: &["number"],
        timeout: TimeoutClass::Standard,
        upstream_paging: false,
        lookup: Some("congress"),
        summary_fields: &["name", "number", "startYear", "endYear", "sessions"],
    },
];

/// Look up a resource by tool name.
#[must_use]
pub fn find(name: &str) -> Option<&'static ResourceDef> {
    RESOURCES.iter().find(|def| def.name == name)
}

/// Resources belonging to any of `groups`, in table order.
pub fn in_groups(groups: &[ToolGroup]) -> impl Iterator<Item = &'static ResourceDef> + '_ {
    RESOURCES
        .iter()
        .filter(move |def| groups.contains(&def.group))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn names_are_unique() {
        let names: HashSet<_> = RESOURCES.iter().map(|def| def.name).collect();
        assert_eq!(names.len(), RESOURCES.len());
    }

    #[test]
    fn path_placeholders_match_path_params() {
        for def in RESOURCES {
            for param in def.params.iter().filter(|p| p.location == Location::Path) {
                assert!(
                    def.path.contains(&format!("{{{}}}", param.name)),
                    "{}: path param {} missing from template",
                    def.name,
                    param.name
                );
                assert!(param.required, "{}: path param {} must be required", def.name, param.name);
            }
            let placeholders = def.path.matches('{').count();
            let path_params = def
                .params
                .iter()
                .filter(|p| p.location == Location::Path)
                .count();
            assert_eq!(placeholders, path_params, "{}: placeholder count", def.name);
        }
    }

    #[test]
    fn every_resource_dedups_and_summarizes() {
        for def in RESOURCES {
            assert!(!def.dedup_keys.is_empty(), "{}", def.name);
            assert!(!def.summary_fields.is_empty(), "{}", def.name);
        }
    }

    #[test]
    fn day_params_follow_year_and_month() {
        for def in RESOURCES {
            if let Some(day) = def.params.iter().position(|p| p.kind == ParamKind::Day) {
                let year = def.params.iter().position(|p| p.name == "year");
                let month = def.params.iter().position(|p| p.name == "month");
                assert!(year.is_some_and(|y| y < day), "{}", def.name);
                assert!(month.is_some_and(|m| m < day), "{}", def.name);
            }
        }
    }

    #[test]
    fn bound_record_uses_extended_timeout_and_historic_years() {
        let def = find("get_bound_congressional_record").expect("resource exists");
        assert_eq!(def.timeout, TimeoutClass::Extended);
        assert_eq!(
            def.param("year").map(|p| p.kind),
            Some(ParamKind::Year {
                min: 1873,
                max: Some(1997)
            })
        );
    }

    #[test]
    fn every_group_has_a_resource() {
        for group in ToolGroup::ALL {
            assert!(in_groups(&[group]).next().is_some(), "{group:?}");
        }
    }

    #[test]
    fn group_parse_is_case_insensitive() {
        assert_eq!(ToolGroup::parse("Bills"), Some(ToolGroup::Bills));
        assert_eq!(ToolGroup::parse(" votes "), Some(ToolGroup::Votes));
        assert_eq!(ToolGroup::parse("billing"), None);
    }
}
