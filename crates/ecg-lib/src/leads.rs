use serde::Serialize;

/// Amplitude scaling of one electrode-pair view of the heart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LeadSpec {
    pub name: &'static str,
    /// Signed scale applied to every wave; negative leads see an inverted complex.
    pub base_amplitude: f64,
    pub description: &'static str,
}

pub const DEFAULT_LEAD: &str = "Lead II";

pub static LEADS: [LeadSpec; 12] = [
    LeadSpec { name: "Lead I", base_amplitude: 1.0, description: "Left arm - Right arm" },
    LeadSpec { name: "Lead II", base_amplitude: 1.2, description: "Left leg - Right arm" },
    LeadSpec { name: "Lead III", base_amplitude: 0.8, description: "Left leg - Left arm" },
    LeadSpec { name: "aVR", base_amplitude: -0.5, description: "Augmented Right arm" },
    LeadSpec { name: "aVL", base_amplitude: 0.6, description: "Augmented Left arm" },
    LeadSpec { name: "aVF", base_amplitude: 1.1, description: "Augmented Left leg" },
    LeadSpec { name: "V1", base_amplitude: 0.3, description: "Right sternal border" },
    LeadSpec { name: "V2", base_amplitude: 0.8, description: "Left sternal border" },
    LeadSpec { name: "V3", base_amplitude: 1.5, description: "Between V2 and V4" },
    LeadSpec { name: "V4", base_amplitude: 2.0, description: "Left midclavicular line" },
    LeadSpec { name: "V5", base_amplitude: 1.8, description: "Left anterior axillary line" },
    LeadSpec { name: "V6", base_amplitude: 1.2, description: "Left midaxillary line" },
];

/// Look up a lead by its exact name.
pub fn find_lead(name: &str) -> Option<&'static LeadSpec> {
    LEADS.iter().find(|lead| lead.name == name)
}

/// Look up a lead, falling back to Lead II for unknown names.
pub fn resolve_lead(name: &str) -> &'static LeadSpec {
    find_lead(name).unwrap_or(&LEADS[1])
}
