//! Controlled vocabularies shared by the search request, upstream payloads
//! and the filter catalog.
//!
//! Every term has two spellings:
//!
//! * a **code** (`MATHEMATIK`), the stable identifier callers use when they
//!   build a request, and
//! * a **label** (`Mathematik`), the value upstream sources send and expect
//!   inside filter clauses.
//!
//! Serde goes through the label in both directions.

use std::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

/// A closed set of terms with a code and an upstream label.
pub trait Vocabulary: Sized + Copy + PartialEq + 'static {
    /// Name used in log lines and error messages.
    const KIND: &'static str;

    fn all() -> &'static [Self];

    fn code(self) -> &'static str;

    fn label(self) -> &'static str;

    fn from_label(value: &str) -> Option<Self> {
        Self::all().iter().copied().find(|term| term.label() == value)
    }

    /// Case-insensitive lookup by code.
    fn from_code(value: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|term| term.code().eq_ignore_ascii_case(value))
    }
}

macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($variant:ident = $code:literal => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl Vocabulary for $name {
            const KIND: &'static str = stringify!($name);

            fn all() -> &'static [Self] {
                &[$($name::$variant),+]
            }

            fn code(self) -> &'static str {
                match self {
                    $($name::$variant => $code),+
                }
            }

            fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.label())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                Self::from_label(&raw).ok_or_else(|| {
                    de::Error::custom(format!(
                        "unsupported {} value: {raw}",
                        <Self as Vocabulary>::KIND
                    ))
                })
            }
        }
    };
}

vocabulary! {
    /// School subject.
    Subject {
        Deutsch = "DEUTSCH" => "Deutsch",
        DeutschAlsZweitsprache = "DEUTSCH_ALS_ZWEITSPRACHE" => "Deutsch als Zweitsprache",
        Englisch = "ENGLISCH" => "Englisch",
        Franzosisch = "FRANZOSISCH" => "Französisch",
        Griechisch = "GRIECHISCH" => "Griechisch",
        Italienisch = "ITALIENISCH" => "Italienisch",
        Latein = "LATEIN" => "Latein",
        Russisch = "RUSSISCH" => "Russisch",
        Sonstige = "SONSTIGE" => "Sonstige",
        Spanisch = "SPANISCH" => "Spanisch",
        Turkisch = "TURKISCH" => "Türkisch",
        Biologie = "BIOLOGIE" => "Biologie",
        Chemie = "CHEMIE" => "Chemie",
        InformatikItb = "INFORMATIK_ITB" => "Informatik/ITB",
        Mathematik = "MATHEMATIK" => "Mathematik",
        Physik = "PHYSIK" => "Physik",
        Sachunterricht = "SACHUNTERRICHT" => "Sachunterricht",
        Umwelt = "UMWELT" => "Umwelt",
        Geografie = "GEOGRAFIE" => "Geografie",
        Geschichte = "GESCHICHTE" => "Geschichte",
        PolitischeBildung = "POLITISCHE_BILDUNG" => "Politische Bildung",
        Wirtschaftskunde = "WIRTSCHAFTSKUNDE" => "Wirtschaftskunde",
        BildendeKunst = "BILDENDE_KUNST" => "Bildende Kunst",
        Musik = "MUSIK" => "Musik",
        Ethik = "ETHIK" => "Ethik",
        Philosophie = "PHILOSOPHIE" => "Philosophie",
        Religion = "RELIGION" => "Religion",
        Sport = "SPORT" => "Sport",
        Arbeitslehre = "ARBEITSLEHRE" => "Arbeitslehre",
        BeruflicheBildung = "BERUFLICHE_BILDUNG" => "Berufliche Bildung",
        ElementarbereichVorschulerziehung = "ELEMENTARBEREICH_VORSCHULERZIEHUNG" => "Elementarbereich, Vorschulerziehung",
        Freizeit = "FREIZEIT" => "Freizeit",
        Gesundheit = "GESUNDHEIT" => "Gesundheit",
        Grundschule = "GRUNDSCHULE" => "Grundschule",
        HeimatraumRegion = "HEIMATRAUM_REGION" => "Heimatraum, Region",
        InterkulturelleBildung = "INTERKULTURELLE_BILDUNG" => "Interkulturelle Bildung",
        KinderUndJugendbildung = "KINDER_UND_JUGENDBILDUNG" => "Kinder- und Jugendbildung",
        Medienpadagogik = "MEDIENPADAGOGIK" => "Medienpädagogik",
        Padagogik = "PADAGOGIK" => "Pädagogik",
        PraxisorientierteFacher = "PRAXISORIENTIERTE_FACHER" => "Praxisorientierte Fächer",
        Psychologie = "PSYCHOLOGIE" => "Psychologie",
        RettenHelfenSchutzen = "RETTEN_HELFEN_SCHUTZEN" => "Retten, Helfen, Schützen",
        SpielUndDokumentarfilm = "SPIEL_UND_DOKUMENTARFILM" => "Spiel- und Dokumentarfilm",
        SuchtUndPravention = "SUCHT_UND_PRAVENTION" => "Sucht und Prävention",
        UbergreifendeThemen = "UBERGREIFENDE_THEMEN" => "Übergreifende Themen",
        Verkehrserziehung = "VERKEHRSERZIEHUNG" => "Verkehrserziehung",
        Weiterbildung = "WEITERBILDUNG" => "Weiterbildung",
    }
}

vocabulary! {
    /// Technical format of a resource (`technicalFormat`).
    MediaType {
        InteractiveAnimation = "INTERACTIVE_ANIMATION" => "Interactive/Animation",
        InteractiveSimulation = "INTERACTIVE_SIMULATION" => "Interactive/Simulation",
        InteractiveWhiteboard = "INTERACTIVE_WHITEBOARD" => "Interactive/Whiteboard",
        MediaAudio = "MEDIA_AUDIO" => "Media/Audio",
        MediaImagesVisuals = "MEDIA_IMAGES_VISUALS" => "Media/Images/Visuals",
        MediaVideo = "MEDIA_VIDEO" => "Media/Video",
        TextBook = "TEXT_BOOK" => "Text/Book",
        TextChapter = "TEXT_CHAPTER" => "Text/Chapter",
        TextDocument = "TEXT_DOCUMENT" => "Text/Document",
        TextPassage = "TEXT_PASSAGE" => "Text/Passage",
        TextReference = "TEXT_REFERENCE" => "Text/Reference",
        TextWebsite = "TEXT_WEBSITE" => "Text/Website",
    }
}

vocabulary! {
    /// School type. DUF sources use their own spelling, see
    /// [`SchoolType::duf_label`].
    SchoolType {
        Kindergarten = "GERMAN_SCHOOL_1" => "Kindergarten",
        Vorschule = "GERMAN_SCHOOL_2" => "Vorschule",
        Grundschule = "GERMAN_SCHOOL_3" => "Grundschule",
        ForderschuleLernen = "GERMAN_SCHOOL_4" => "Förderschule Lernen",
        Hauptschule = "GERMAN_SCHOOL_5" => "Hauptschule",
        Realschule = "GERMAN_SCHOOL_6" => "Realschule",
        Gymnasium = "GERMAN_SCHOOL_7" => "Gymnasium",
        IntegrierteGesamtschule = "GERMAN_SCHOOL_8" => "Integrierte Gesamtschule",
        GymnasialeOberstufe = "GERMAN_SCHOOL_9" => "Gymnasiale Oberstufe",
        Fachoberschule = "GERMAN_SCHOOL_10" => "Fachoberschule",
        Berufsschule = "GERMAN_SCHOOL_11" => "Berufsschule",
        ForderschuleEmotionaleEntwicklung = "GERMAN_SCHOOL_12" => "Förderschule emotionale und soziale Entwicklung",
        ForderschuleGeistigeEntwicklung = "GERMAN_SCHOOL_13" => "Förderschule geistige Entwicklung",
        ForderschuleSprache = "GERMAN_SCHOOL_14" => "Förderschule Sprache",
    }
}

impl SchoolType {
    pub fn duf_label(self) -> &'static str {
        match self {
            Self::Realschule => "Mittlere Schulform",
            Self::IntegrierteGesamtschule => "Gymnasium",
            other => other.label(),
        }
    }
}

vocabulary! {
    /// Learning resource type. DUF sources use their own spelling for the
    /// assessment types, see [`LearningResourceType::duf_label`].
    LearningResourceType {
        ActivityExperiment = "ACTIVITY_EXPERIMENT" => "Activity/Experiment",
        ActivityLearning = "ACTIVITY_LEARNING" => "Activity/Learning",
        ActivityWorksheet = "ACTIVITY_WORKSHEET" => "Activity/Worksheet",
        AssessmentFormative = "ASSESSMENT_FORMATIVE" => "Assessment/Formative",
        AssessmentInterim = "ASSESSMENT_INTERIM" => "Assessment/Interim",
        AssessmentItem = "ASSESSMENT_ITEM" => "Assessment/Item",
        AssessmentPreparation = "ASSESSMENT_PREPARATION" => "Assessment/Preparation",
        AssessmentRubric = "ASSESSMENT_RUBRIC" => "Assessment/Rubric",
        CollectionCourse = "COLLECTION_COURSE" => "Collection/Course",
        CollectionCurriculumGuide = "COLLECTION_CURRICULUM_GUIDE" => "Collection/Curriculum Guide",
        CollectionLesson = "COLLECTION_LESSON" => "Collection/Lesson",
        CollectionUnit = "COLLECTION_UNIT" => "Collection/Unit",
        Game = "GAME" => "Game",
        Lecture = "LECTURE" => "Lecture",
    }
}

impl LearningResourceType {
    pub fn duf_label(self) -> &'static str {
        match self {
            Self::AssessmentFormative => "Überblicksdiagnose",
            Self::AssessmentInterim => "Detaildiagnose",
            Self::AssessmentPreparation => "Test zum Thema",
            other => other.label(),
        }
    }
}

vocabulary! {
    /// German federal state.
    FederalState {
        BadenWurttemberg = "BADEN_WURTEMBERG" => "Baden-Württemberg",
        Bayern = "BAYERN" => "Bayern",
        Berlin = "BERLIN" => "Berlin",
        Brandenburg = "BRANDENBURG" => "Brandenburg",
        Bremen = "BREMEN" => "Bremen",
        Hamburg = "HAMBURG" => "Hamburg",
        Hessen = "HESSEN" => "Hessen",
        MecklenburgVorpommern = "MECKLENBURG_VORPOMMERN" => "Mecklenburg-Vorpommern",
        Niedersachsen = "NIEDERSACHSEN" => "Niedersachsen",
        NordrheinWestfalen = "NORDRHEIN_WESTFALEN" => "Nordrhein-Westfalen",
        RheinlandPfalz = "RHEINLAND_PFALZ" => "Rheinland-Pfalz",
        Saarland = "SAARLAND" => "Saarland",
        Sachsen = "SACHSEN" => "Sachsen",
        SachsenAnhalt = "SACHSEN_ANHALT" => "Sachsen-Anhalt",
        SchleswigHolstein = "SCHLESWIG_HOLSTEIN" => "Schleswig-Holstein",
        Thuringen = "THURINGEN" => "Thüringen",
    }
}

vocabulary! {
    Grade {
        Grade1 = "GRADE_1" => "4. Klasse",
        Grade2 = "GRADE_2" => "5. Klasse",
        Grade3 = "GRADE_3" => "6. Klasse",
        Grade4 = "GRADE_4" => "7. Klasse",
        Grade5 = "GRADE_5" => "8. Klasse",
        Grade6 = "GRADE_6" => "9. Klasse",
        Grade7 = "GRADE_7" => "10. Klasse",
        Grade8 = "GRADE_8" => "1. Lernjahr",
        Grade9 = "GRADE_9" => "2. Lernjahr",
    }
}

vocabulary! {
    /// School year, sent upstream as `typicalAgeRange`.
    StudyYear {
        Year1 = "YEAR_1" => "1",
        Year2 = "YEAR_2" => "2",
        Year3 = "YEAR_3" => "3",
        Year4 = "YEAR_4" => "4",
        Year5 = "YEAR_5" => "5",
        Year6 = "YEAR_6" => "6",
        Year7 = "YEAR_7" => "7",
        Year8 = "YEAR_8" => "8",
        Year9 = "YEAR_9" => "9",
        Year10 = "YEAR_10" => "10",
        Year11 = "YEAR_11" => "11",
        Year12 = "YEAR_12" => "12",
        Year13 = "YEAR_13" => "13",
    }
}

vocabulary! {
    /// Textbook series a resource belongs to.
    SchoolBook {
        Access = "SCHOOL_BOOK_1" => "Access",
        APlusNeueAusgabe = "SCHOOL_BOOK_2" => "À Plus Neue Ausgabe",
        AToiNeueAusgabe = "SCHOOL_BOOK_3" => "À toi Neue Ausgabe",
        ForderschuleLernen = "SCHOOL_BOOK_4" => "Förderschule Lernen",
        Biosphare = "SCHOOL_BOOK_5" => "Biosphäre",
        ChemieFokus = "SCHOOL_BOOK_6" => "Chemie Fokus",
        DeutschbuchGym = "SCHOOL_BOOK_7" => "Deutschbuch GYM",
        DeutschbuchMsf = "SCHOOL_BOOK_8" => "Deutschbuch MSF",
        DoppelKlick = "SCHOOL_BOOK_9" => "DoppelKlick",
        DreifachMathe = "SCHOOL_BOOK_10" => "Dreifach Mathe",
        DWieDeutsch = "SCHOOL_BOOK_11" => "D wie Deutsch",
        ForumGeschichte = "SCHOOL_BOOK_12" => "Forum Geschichte",
        FundamenteDerMathematik = "SCHOOL_BOOK_13" => "Fundamente der Mathematik",
        Headlight = "SCHOOL_BOOK_14" => "Headlight",
        Highlight = "SCHOOL_BOOK_15" => "Highlight",
        Lehrwerksunabhangig = "SCHOOL_BOOK_16" => "Lehrwerksunabhängig",
        Lighthouse = "SCHOOL_BOOK_17" => "Lighthouse",
        MuttersprachePlus = "SCHOOL_BOOK_18" => "Muttersprache plus",
        Parallelo = "SCHOOL_BOOK_19" => "Parallelo",
        ParalleloBasis = "SCHOOL_BOOK_20" => "Parallelo Basis",
        PhysikUniversum = "SCHOOL_BOOK_21" => "Physik Universum",
    }
}

vocabulary! {
    /// Quality rating assigned by the source, 1 to 5.
    Rating {
        One = "1" => "1",
        Two = "2" => "2",
        Three = "3" => "3",
        Four = "4" => "4",
        Five = "5" => "5",
    }
}

/// Whether a source speaks the default LOR dialect or the DUF one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    #[default]
    Default,
    Duf,
}
