//! Static advice and alert tables.
//!
//! Each category carries five high/low advice text pairs and one alert
//! group with a three-item high branch and a three-item low branch. The
//! band picks the branch; the rolled advice index picks the pair. Alert
//! items carry kind tags only, never rendering concerns.

use bcp_common::prediction::Band;
use bcp_common::Category;
use serde::{Deserialize, Serialize};

/// Number of advice pairs per category.
pub const ADVICE_VARIANTS: usize = 5;

/// Number of alert items per branch.
pub const ALERTS_PER_BRANCH: usize = 3;

/// Action tag for an alert item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Call,
    Escalate,
    Team,
    Mail,
    Schedule,
    Resolve,
    Hire,
    Revenue,
    Growth,
    Dismiss,
}

/// One alert item in a branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertSpec {
    pub kind: AlertKind,
    pub title: &'static str,
    pub description: &'static str,
}

/// Owned alert item for snapshots and wire output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub kind: AlertKind,
    pub title: String,
    pub description: String,
}

impl From<&AlertSpec> for AlertRecord {
    fn from(spec: &AlertSpec) -> Self {
        Self {
            kind: spec.kind,
            title: spec.title.to_string(),
            description: spec.description.to_string(),
        }
    }
}

/// High/low advice text pair.
#[derive(Debug, Clone, Copy)]
pub struct AdvicePair {
    pub high: &'static str,
    pub low: &'static str,
}

const TICKET_ADVICE: [AdvicePair; ADVICE_VARIANTS] = [
    AdvicePair {
        high: "Assign your most experienced support agents to handle this ticket immediately. The customer is likely experiencing significant issues that could impact their business operations.",
        low: "This ticket can be handled by your regular support team during standard hours. Consider using automated responses for initial troubleshooting steps.",
    },
    AdvicePair {
        high: "Escalate this ticket to a senior technician. Consider offering a courtesy call to address the customer's concerns directly and prevent potential churn.",
        low: "Add this ticket to your regular queue. Use your knowledge base to provide self-service options to the customer while they wait.",
    },
    AdvicePair {
        high: "This is a critical issue requiring immediate attention. Assign a dedicated support engineer and provide hourly updates to the customer until resolved.",
        low: "Schedule this ticket for resolution within the next 24-48 hours. Send the customer relevant documentation that might help them in the meantime.",
    },
    AdvicePair {
        high: "Flag this ticket for management review. The customer may need special attention and a customized solution to address their complex issue.",
        low: "This is a routine issue that can be handled through your standard support process. Consider using this as a training opportunity for new support staff.",
    },
    AdvicePair {
        high: "This ticket indicates a potential system-wide issue. Investigate if other customers are experiencing similar problems and prepare a coordinated response.",
        low: "This is a minor issue that can be addressed with standard troubleshooting. Consider adding the solution to your FAQ section to help other customers.",
    },
];

const SALES_ADVICE: [AdvicePair; ADVICE_VARIANTS] = [
    AdvicePair {
        high: "Your Q4 forecast shows strong growth potential. Consider increasing inventory and staffing to meet the anticipated demand.",
        low: "Sales projections indicate a slower period ahead. Focus on customer retention strategies and optimize your marketing spend.",
    },
    AdvicePair {
        high: "Your software product line is showing exceptional growth. Allocate additional resources to development and consider expanding feature offerings.",
        low: "Hardware sales are underperforming. Review pricing strategy and consider bundle offers to increase average order value.",
    },
    AdvicePair {
        high: "The North region is outperforming expectations. Identify successful strategies that can be replicated in other regions.",
        low: "The South region needs attention. Schedule training for the sales team and review territory assignments.",
    },
    AdvicePair {
        high: "New customer acquisition is strong. Invest in onboarding processes to ensure high retention rates for these new customers.",
        low: "Existing customer sales are below target. Launch a re-engagement campaign with special offers for dormant accounts.",
    },
    AdvicePair {
        high: "B2B sales are trending upward. Develop case studies highlighting success stories to further strengthen your enterprise positioning.",
        low: "Consumer segment sales are declining. Review your product positioning and consider refreshing your brand messaging.",
    },
];

const ENQUIRY_ADVICE: [AdvicePair; ADVICE_VARIANTS] = [
    AdvicePair {
        high: "Product information requests show high conversion potential. Ensure your sales team follows up within 2 hours with detailed specifications.",
        low: "These general inquiries have lower conversion rates. Use automated responses with links to your knowledge base.",
    },
    AdvicePair {
        high: "Website leads are showing strong intent. Implement immediate callback options to capitalize on this high-quality traffic source.",
        low: "Social media inquiries are showing lower engagement. Review your social content strategy to better qualify leads.",
    },
    AdvicePair {
        high: "Enterprise inquiries are increasing. Prepare customized presentations addressing industry-specific challenges for these high-value prospects.",
        low: "Small business inquiries are numerous but converting poorly. Create a streamlined, self-service option for this segment.",
    },
    AdvicePair {
        high: "Demo requests are up 30% this month. Ensure your demo team is properly staffed and trained on highlighting new features.",
        low: "Support inquiries are being misclassified as sales opportunities. Improve your routing logic to direct these to the appropriate team.",
    },
    AdvicePair {
        high: "Technology sector inquiries show high intent. Develop sector-specific messaging highlighting relevant case studies and ROI metrics.",
        low: "Retail sector inquiries have increased but show lower conversion intent. Create educational content addressing common pain points.",
    },
];

const TICKET_ALERTS_HIGH: [AlertSpec; ALERTS_PER_BRANCH] = [
    AlertSpec {
        kind: AlertKind::Call,
        title: "Immediate Call Required",
        description: "Call the customer within the next 30 minutes to address their urgent issue.",
    },
    AlertSpec {
        kind: AlertKind::Escalate,
        title: "Escalate to Management",
        description: "This ticket requires management attention due to its critical nature.",
    },
    AlertSpec {
        kind: AlertKind::Team,
        title: "Assign Senior Agent",
        description: "Route this ticket to your most experienced support staff immediately.",
    },
];

const TICKET_ALERTS_LOW: [AlertSpec; ALERTS_PER_BRANCH] = [
    AlertSpec {
        kind: AlertKind::Mail,
        title: "Send Automated Response",
        description: "Trigger the standard troubleshooting email sequence for this issue type.",
    },
    AlertSpec {
        kind: AlertKind::Schedule,
        title: "Schedule for Later",
        description: "Add to the regular queue with a 24-hour response window.",
    },
    AlertSpec {
        kind: AlertKind::Resolve,
        title: "Knowledge Base Solution",
        description: "This issue can likely be resolved with existing documentation.",
    },
];

const SALES_ALERTS_HIGH: [AlertSpec; ALERTS_PER_BRANCH] = [
    AlertSpec {
        kind: AlertKind::Hire,
        title: "Increase Sales Staff",
        description: "Hire additional sales representatives to handle projected growth.",
    },
    AlertSpec {
        kind: AlertKind::Revenue,
        title: "Adjust Revenue Targets",
        description: "Update Q3 and Q4 targets to reflect positive forecast changes.",
    },
    AlertSpec {
        kind: AlertKind::Growth,
        title: "Expand Marketing Budget",
        description: "Increase marketing spend by 15% to capitalize on growth momentum.",
    },
];

const SALES_ALERTS_LOW: [AlertSpec; ALERTS_PER_BRANCH] = [
    AlertSpec {
        kind: AlertKind::Team,
        title: "Focus on Retention",
        description: "Shift resources to customer retention programs to maintain revenue.",
    },
    AlertSpec {
        kind: AlertKind::Dismiss,
        title: "Reduce Inventory Orders",
        description: "Adjust inventory levels downward to avoid excess stock.",
    },
    AlertSpec {
        kind: AlertKind::Revenue,
        title: "Review Pricing Strategy",
        description: "Consider promotional pricing to stimulate demand in coming quarters.",
    },
];

const ENQUIRY_ALERTS_HIGH: [AlertSpec; ALERTS_PER_BRANCH] = [
    AlertSpec {
        kind: AlertKind::Call,
        title: "Immediate Follow-up",
        description: "Contact this lead within 1 hour to maximize conversion potential.",
    },
    AlertSpec {
        kind: AlertKind::Hire,
        title: "Assign Senior Sales Rep",
        description: "Route this inquiry to your top-performing sales representative.",
    },
    AlertSpec {
        kind: AlertKind::Revenue,
        title: "Prepare Custom Proposal",
        description: "Develop a tailored proposal with premium options for this prospect.",
    },
];

const ENQUIRY_ALERTS_LOW: [AlertSpec; ALERTS_PER_BRANCH] = [
    AlertSpec {
        kind: AlertKind::Dismiss,
        title: "Close This Enquiry",
        description: "This lead shows low conversion potential and should be deprioritized.",
    },
    AlertSpec {
        kind: AlertKind::Mail,
        title: "Send Automated Sequence",
        description: "Enroll in the standard email nurture campaign for low-intent leads.",
    },
    AlertSpec {
        kind: AlertKind::Schedule,
        title: "Schedule for Later",
        description: "Add to the general follow-up queue for next week.",
    },
];

fn advice_table(category: Category) -> &'static [AdvicePair; ADVICE_VARIANTS] {
    match category {
        Category::Ticket => &TICKET_ADVICE,
        Category::Sales => &SALES_ADVICE,
        Category::Enquiry => &ENQUIRY_ADVICE,
    }
}

/// Advice text for the rolled index and band.
pub fn advice_for(category: Category, index: usize, band: Band) -> &'static str {
    let pair = &advice_table(category)[index % ADVICE_VARIANTS];
    match band {
        Band::High => pair.high,
        Band::Low => pair.low,
    }
}

/// The whole alert branch for the category and band.
pub fn alerts_for(category: Category, band: Band) -> &'static [AlertSpec; ALERTS_PER_BRANCH] {
    match (category, band) {
        (Category::Ticket, Band::High) => &TICKET_ALERTS_HIGH,
        (Category::Ticket, Band::Low) => &TICKET_ALERTS_LOW,
        (Category::Sales, Band::High) => &SALES_ALERTS_HIGH,
        (Category::Sales, Band::Low) => &SALES_ALERTS_LOW,
        (Category::Enquiry, Band::High) => &ENQUIRY_ALERTS_HIGH,
        (Category::Enquiry, Band::Low) => &ENQUIRY_ALERTS_LOW,
    }
}
