//! Column schemas: the declared communities layout and header-based inference

use crate::csv_reader::{is_missing_token, CsvData};
use crate::structs::{Column, ColumnKind, CrimeError, Result, Schema};
use std::collections::HashSet;

/// Target column of the communities dataset
pub const COMMUNITIES_TARGET: &str = "ViolentCrimesPerPop";

/// Non-predictive leading columns of the communities dataset
const COMMUNITIES_IDENTIFIERS: [(&str, ColumnKind); 5] = [
    ("state", ColumnKind::Identifier),
    ("county", ColumnKind::Identifier),
    ("community", ColumnKind::Identifier),
    ("communityname", ColumnKind::Label),
    ("fold", ColumnKind::Fold),
];

/// Counts that are not range-normalized in the source documentation
const COMMUNITIES_RAW_COUNTS: [&str; 7] = [
    "numbUrban",
    "NumUnderPov",
    "NumIlleg",
    "NumImmig",
    "HousVacant",
    "NumInShelters",
    "NumStreet",
];

const COMMUNITIES_PREDICTORS: [&str; 122] = [
    "population", "householdsize", "racepctblack", "racePctWhite", "racePctAsian",
    "racePctHisp", "agePct12t21", "agePct12t29", "agePct16t24", "agePct65up", "numbUrban",
    "pctUrban", "medIncome", "pctWWage", "pctWFarmSelf", "pctWInvInc", "pctWSocSec",
    "pctWPubAsst", "pctWRetire", "medFamInc", "perCapInc", "whitePerCap", "blackPerCap",
    "indianPerCap", "AsianPerCap", "OtherPerCap", "HispPerCap", "NumUnderPov",
    "PctPopUnderPov", "PctLess9thGrade", "PctNotHSGrad", "PctBSorMore", "PctUnemployed",
    "PctEmploy", "PctEmplManu", "PctEmplProfServ", "PctOccupManu", "PctOccupMgmtProf",
    "MalePctDivorce", "MalePctNevMarr", "FemalePctDiv", "TotalPctDiv", "PersPerFam",
    "PctFam2Par", "PctKids2Par", "PctYoungKids2Par", "PctTeen2Par", "PctWorkMomYoungKids",
    "PctWorkMom", "NumIlleg", "PctIlleg", "NumImmig", "PctImmigRecent", "PctImmigRec5",
    "PctImmigRec8", "PctImmigRec10", "PctRecentImmig", "PctRecImmig5", "PctRecImmig8",
    "PctRecImmig10", "PctSpeakEnglOnly", "PctNotSpeakEnglWell", "PctLargHouseFam",
    "PctLargHouseOccup", "PersPerOccupHous", "PersPerOwnOccHous", "PersPerRentOccHous",
    "PctPersOwnOccup", "PctPersDenseHous", "PctHousLess3BR", "MedNumBR", "HousVacant",
    "PctHousOccup", "PctHousOwnOcc", "PctVacantBoarded", "PctVacMore6Mos", "MedYrHousBuilt",
    "PctHousNoPhone", "PctWOFullPlumb", "OwnOccLowQuart", "OwnOccMedVal", "OwnOccHiQuart",
    "RentLowQ", "RentMedian", "RentHighQ", "MedRent", "MedRentPctHousInc",
    "MedOwnCostPctInc", "MedOwnCostPctIncNoMtg", "NumInShelters", "NumStreet",
    "PctForeignBorn", "PctBornSameState", "PctSameHouse85", "PctSameCity85",
    "PctSameState85", "LemasSwornFT", "LemasSwFTPerPop", "LemasSwFTFieldOps",
    "LemasSwFTFieldPerPop", "LemasTotalReq", "LemasTotReqPerPop", "PolicReqPerOffic",
    "PolicPerPop", "RacialMatchCommPol", "PctPolicWhite", "PctPolicBlack", "PctPolicHisp",
    "PctPolicAsian", "PctPolicMinor", "OfficAssgnDrugUnits", "NumKindsDrugsSeiz",
    "PolicAveOTWorked", "LandArea", "PopDens", "PctUsePubTrans", "PolicCars",
    "PolicOperBudg", "LemasPctPolicOnPatr", "LemasGangUnitDeploy", "LemasPctOfficDrugUn",
    "PolicBudgPerPop",
];

impl Schema {
    /// Build a schema, checking for unique names and exactly one target
    ///
    /// # Errors
    /// Returns error if the column list is empty, has duplicate names,
    /// or does not contain exactly one target column
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        if columns.is_empty() {
            return Err(CrimeError::Schema("Schema has no columns".into()));
        }

        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(CrimeError::Schema(format!(
                    "Duplicate column name: {}",
                    column.name
                )));
            }
        }

        let targets: Vec<usize> = columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.kind == ColumnKind::Target)
            .map(|(i, _)| i)
            .collect();

        match targets.as_slice() {
            [target] => Ok(Self {
                target: *target,
                columns,
            }),
            [] => Err(CrimeError::Schema("Schema has no target column".into())),
            _ => Err(CrimeError::Schema(format!(
                "Schema has {} target columns, expected exactly one",
                targets.len()
            ))),
        }
    }

    /// The 128-column communities-and-crime layout
    #[must_use]
    pub fn communities() -> Self {
        let mut columns: Vec<Column> = COMMUNITIES_IDENTIFIERS
            .iter()
            .map(|&(name, kind)| Column {
                name: name.to_string(),
                kind,
            })
            .collect();

        columns.extend(COMMUNITIES_PREDICTORS.iter().map(|&name| Column {
            name: name.to_string(),
            kind: if COMMUNITIES_RAW_COUNTS.contains(&name) {
                ColumnKind::RawCount
            } else {
                ColumnKind::Feature
            },
        }));

        let target = columns.len();
        columns.push(Column {
            name: COMMUNITIES_TARGET.to_string(),
            kind: ColumnKind::Target,
        });

        Self { columns, target }
    }

    /// Infer a schema from parsed CSV data
    ///
    /// Columns named in `identifiers` are non-predictive codes, a column named
    /// `fold` is the fold marker, columns with any non-numeric value are labels,
    /// everything else is a feature.
    ///
    /// # Errors
    /// Returns error if the target or an identifier is not among the headers
    pub fn infer(csv: &CsvData, target: &str, identifiers: &[String]) -> Result<Self> {
        if csv.column_index(target).is_none() {
            return Err(CrimeError::Schema(format!(
                "Target column '{target}' not found in headers"
            )));
        }
        if let Some(missing) = identifiers.iter().find(|id| csv.column_index(id).is_none()) {
            return Err(CrimeError::Schema(format!(
                "Identifier column '{missing}' not found in headers"
            )));
        }

        let columns = csv
            .headers
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let kind = if name == target {
                    ColumnKind::Target
                } else if identifiers.iter().any(|id| id == name) {
                    ColumnKind::Identifier
                } else if name.eq_ignore_ascii_case("fold") {
                    ColumnKind::Fold
                } else if is_text_column(csv, i) {
                    ColumnKind::Label
                } else {
                    ColumnKind::Feature
                };
                Column {
                    name: name.clone(),
                    kind,
                }
            })
            .collect();

        Self::new(columns)
    }

    /// Check that a header row matches the declared columns exactly
    ///
    /// # Errors
    /// Returns a schema error naming the first mismatch
    pub fn check_headers(&self, headers: &[String]) -> Result<()> {
        for (i, column) in self.columns.iter().enumerate() {
            match headers.get(i) {
                Some(h) if h.trim() == column.name => {}
                Some(h) => {
                    return Err(CrimeError::Schema(format!(
                        "Column {} is '{}', expected '{}'",
                        i + 1,
                        h,
                        column.name
                    )));
                }
                None => {
                    return Err(CrimeError::Schema(format!(
                        "Missing column '{}' (file has {} columns, schema declares {})",
                        column.name,
                        headers.len(),
                        self.columns.len()
                    )));
                }
            }
        }

        if headers.len() > self.columns.len() {
            return Err(CrimeError::Schema(format!(
                "Unexpected extra column '{}' (file has {} columns, schema declares {})",
                headers[self.columns.len()],
                headers.len(),
                self.columns.len()
            )));
        }

        Ok(())
    }

    #[must_use]
    pub fn target_column(&self) -> &Column {
        &self.columns[self.target]
    }

    /// Indices of the columns usable as model inputs
    #[must_use]
    pub fn predictor_indices(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.kind.is_predictor())
            .map(|(i, _)| i)
            .collect()
    }

    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

/// A column is text if any present value fails to parse as a number
fn is_text_column(csv: &CsvData, index: usize) -> bool {
    csv.column(index).is_some_and(|col| {
        col.iter()
            .filter(|s| !is_missing_token(s))
            .any(|s| s.trim().parse::<f64>().is_err())
    })
}
