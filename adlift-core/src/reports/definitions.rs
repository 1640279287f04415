//! Supported report configurations.
//!
//! The reporting API only accepts a handful of report type/grouping
//! combinations; anything else is rejected client-side before a request is
//! spent on it.

/// One supported reporting configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDefinition {
    pub report_type_id: &'static str,
    pub group_by: &'static [&'static str],
}

const CAMPAIGNS: ReportDefinition = ReportDefinition {
    report_type_id: "spCampaigns",
    group_by: &["campaign"],
};

const KEYWORDS: ReportDefinition = ReportDefinition {
    report_type_id: "spKeywords",
    group_by: &["campaign", "adGroup", "keyword"],
};

const TARGETS: ReportDefinition = ReportDefinition {
    report_type_id: "spTargets",
    group_by: &["campaign", "adGroup", "targeting"],
};

const SEARCH_TERMS: ReportDefinition = ReportDefinition {
    report_type_id: "spSearchTerm",
    group_by: &["campaign", "adGroup", "searchTerm"],
};

/// Look up the definition for a report type and optional segment.
///
/// The only supported segment is `query` on target reports, which selects
/// the search-term variant.
pub fn lookup(report_type: &str, segment: Option<&str>) -> Option<&'static ReportDefinition> {
    let report_type = report_type.to_lowercase();
    let segment = segment.map(|s| s.to_lowercase()).filter(|s| !s.is_empty());

    match (report_type.as_str(), segment.as_deref()) {
        ("campaigns", None) => Some(&CAMPAIGNS),
        ("keywords", None) => Some(&KEYWORDS),
        ("targets", None) => Some(&TARGETS),
        ("targets", Some("query")) => Some(&SEARCH_TERMS),
        _ => None,
    }
}
