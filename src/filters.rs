//! Catalog of supported filter values.
//!
//! The enumerations are static. Subjects are grouped into fixed subject
//! areas and then reduced to the subjects at least one active source
//! reports, so callers never offer a filter that cannot match.

use serde::Serialize;

use crate::model::{
    FederalState, Grade, LearningResourceType, MediaType, SchoolBook, SchoolType, StudyYear,
    Subject, Vocabulary,
};
use crate::source::Source;

/// Subject areas in display order.
pub static SUBJECT_GROUPS: &[(&str, &[Subject])] = &[
    (
        "LANGUAGES",
        &[
            Subject::Deutsch,
            Subject::DeutschAlsZweitsprache,
            Subject::Englisch,
            Subject::Franzosisch,
            Subject::Griechisch,
            Subject::Italienisch,
            Subject::Latein,
            Subject::Russisch,
            Subject::Sonstige,
            Subject::Spanisch,
            Subject::Turkisch,
        ],
    ),
    (
        "STEM",
        &[
            Subject::Biologie,
            Subject::Chemie,
            Subject::InformatikItb,
            Subject::Mathematik,
            Subject::Physik,
            Subject::Sachunterricht,
            Subject::Umwelt,
        ],
    ),
    (
        "SOCIAL_SCIENCES",
        &[
            Subject::Geografie,
            Subject::Geschichte,
            Subject::PolitischeBildung,
            Subject::Wirtschaftskunde,
        ],
    ),
    ("ARTS", &[Subject::BildendeKunst, Subject::Musik]),
    (
        "ETHICS_PHILOSOPHY_RELIGION",
        &[Subject::Ethik, Subject::Philosophie, Subject::Religion],
    ),
    ("SPORTS", &[Subject::Sport]),
    (
        "OTHERS",
        &[
            Subject::Arbeitslehre,
            Subject::BeruflicheBildung,
            Subject::ElementarbereichVorschulerziehung,
            Subject::Freizeit,
            Subject::Gesundheit,
            Subject::Grundschule,
            Subject::HeimatraumRegion,
            Subject::InterkulturelleBildung,
            Subject::KinderUndJugendbildung,
            Subject::Medienpadagogik,
            Subject::Padagogik,
            Subject::PraxisorientierteFacher,
            Subject::Psychologie,
            Subject::RettenHelfenSchutzen,
            Subject::SpielUndDokumentarfilm,
            Subject::SuchtUndPravention,
            Subject::UbergreifendeThemen,
            Subject::Verkehrserziehung,
            Subject::Weiterbildung,
        ],
    ),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectGroup {
    pub name: &'static str,
    pub items: Vec<Subject>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublisherEntry {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCatalog {
    pub subjects: Vec<SubjectGroup>,
    pub media_types: Vec<MediaType>,
    pub learning_resource_types: Vec<LearningResourceType>,
    pub school_types: Vec<SchoolType>,
    pub study_years: Vec<StudyYear>,
    pub publishers: Vec<PublisherEntry>,
    pub federal_states: Vec<FederalState>,
    pub school_books: Vec<SchoolBook>,
    pub grades: Vec<Grade>,
}

impl FilterCatalog {
    /// `available_subjects` are the subject names the sources report;
    /// `publishers` the active sources.
    pub fn build(available_subjects: &[String], publishers: &[Source]) -> Self {
        let subjects = SUBJECT_GROUPS
            .iter()
            .map(|&(name, members)| SubjectGroup {
                name,
                items: members
                    .iter()
                    .copied()
                    .filter(|s| available_subjects.iter().any(|a| a == s.label()))
                    .collect(),
            })
            .collect();

        Self {
            subjects,
            media_types: MediaType::all().to_vec(),
            learning_resource_types: LearningResourceType::all().to_vec(),
            school_types: SchoolType::all().to_vec(),
            study_years: StudyYear::all().to_vec(),
            publishers: publishers
                .iter()
                .map(|s| PublisherEntry {
                    id: s.id.clone(),
                    name: s.display_name.clone(),
                })
                .collect(),
            federal_states: FederalState::all().to_vec(),
            school_books: SchoolBook::all().to_vec(),
            grades: Grade::all().to_vec(),
        }
    }
}
