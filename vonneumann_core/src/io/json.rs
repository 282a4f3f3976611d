//! Module providing JSON IO for networks, using the COBRA JSON model layout
use std::fs;
use std::io::Write;
use std::path::Path;

use indexmap::IndexMap;
use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::io::{metabolite_label, reaction_label};
use crate::network::sparse::{NetworkError, SparseNetwork};

// region JSON Model
/// Represents a JSON serialized model, used for reading and writing networks in json format
///
/// Fields the network has no use for (genes, notes, annotations, ...) are ignored on read.
#[derive(Serialize, Deserialize, Debug)]
struct JsonModel {
    #[serde(default)]
    metabolites: Vec<JsonMetabolite>,
    #[serde(default)]
    reactions: Vec<JsonReaction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
struct JsonMetabolite {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    compartment: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
struct JsonReaction {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    metabolites: IndexMap<String, f64>,
    #[serde(default)]
    lower_bound: f64,
    #[serde(default = "default_upper_bound")]
    upper_bound: f64,
    #[serde(default)]
    gene_reaction_rule: String,
}

fn default_upper_bound() -> f64 {
    1000.
}
// endregion JSON Model

// region Conversions
/// Parse a COBRA JSON model into a network
///
/// Metabolites keep the order of the `metabolites` array and are named by their id,
/// reactions are named by their id. A metabolite used by a reaction but missing from
/// the `metabolites` array is an error.
pub fn parse_json_network(content: &str) -> Result<SparseNetwork, JsonError> {
    let json_model = match serde_json::from_str::<JsonModel>(content) {
        Ok(model) => model,
        Err(err) => return Err(JsonError::UnableToParse(format!("{}", err))),
    };
    from_json(json_model)
}

/// Read a COBRA JSON model file into a network
pub fn read_json<P: AsRef<Path>>(path: P) -> Result<SparseNetwork, JsonError> {
    let model_str = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(err) => return Err(JsonError::UnableToRead(format!("{}", err))),
    };
    parse_json_network(&model_str)
}

/// Write a network to `path` as a COBRA JSON model
pub fn write_json<P: AsRef<Path>>(network: &SparseNetwork, path: P) -> Result<(), JsonError> {
    let model_string = serde_json::to_string_pretty(&to_json(network))?;
    fs::write(path, model_string)?;
    Ok(())
}

/// Write a network as a COBRA JSON model to any writer
pub fn write_json_to<W: Write>(network: &SparseNetwork, writer: W) -> Result<(), JsonError> {
    serde_json::to_writer_pretty(writer, &to_json(network))?;
    Ok(())
}

fn from_json(json_model: JsonModel) -> Result<SparseNetwork, JsonError> {
    let mut stoichiometries: IndexMap<String, Vec<(usize, f64)>> = json_model
        .metabolites
        .into_iter()
        .map(|m| (m.id, Vec::new()))
        .collect();

    for (index, rxn) in json_model.reactions.iter().enumerate() {
        if rxn.lower_bound < 0. {
            warn!(
                "Reaction {} has lower bound {}, treated as irreversible",
                rxn.id, rxn.lower_bound
            );
        }
        for (met, coefficient) in &rxn.metabolites {
            match stoichiometries.get_mut(met) {
                Some(stoichiometry) => {
                    if *coefficient != 0. {
                        stoichiometry.push((index, *coefficient))
                    }
                }
                None => {
                    return Err(JsonError::UnknownMetabolite {
                        reaction: rxn.id.clone(),
                        metabolite: met.clone(),
                    })
                }
            }
        }
    }

    let mut network = SparseNetwork::new(json_model.reactions.len());
    for (index, rxn) in json_model.reactions.iter().enumerate() {
        network.set_reaction_name(index, &rxn.id)?;
    }
    for (id, stoichiometry) in stoichiometries {
        network.add_metabolite(Some(id), &stoichiometry)?;
    }
    Ok(network)
}

fn to_json(network: &SparseNetwork) -> JsonModel {
    let json_metabolites: Vec<JsonMetabolite> = (0..network.n_metabolites())
        .map(|index| JsonMetabolite {
            id: metabolite_label(network, index),
            name: None,
            compartment: None,
        })
        .collect();

    let mut json_reactions: Vec<JsonReaction> = (0..network.n_reactions())
        .map(|index| JsonReaction {
            id: reaction_label(network, index),
            name: None,
            metabolites: IndexMap::new(),
            lower_bound: 0.,
            upper_bound: default_upper_bound(),
            gene_reaction_rule: String::new(),
        })
        .collect();
    for (index, met) in network.metabolites().iter().enumerate() {
        let id = &json_metabolites[index].id;
        for entry in met.input.iter().chain(met.output.iter()) {
            // Both sides of the same reaction collapse into one net coefficient
            json_reactions[entry.reaction]
                .metabolites
                .insert(id.clone(), met.signed_coefficient(entry.reaction));
        }
    }

    JsonModel {
        metabolites: json_metabolites,
        reactions: json_reactions,
        id: None,
    }
}

#[derive(Error, Debug)]
pub enum JsonError {
    #[error("Unable to read file due to {0}")]
    UnableToRead(String),
    #[error("Unable to parse json due to {0}")]
    UnableToParse(String),
    #[error("Reaction {reaction} uses undeclared metabolite {metabolite}")]
    UnknownMetabolite { reaction: String, metabolite: String },
    #[error("Serde json parse error")]
    SerdeJsonParseError(#[from] serde_json::Error),
    #[error("Unable to write to file")]
    UnableToWrite(#[from] std::io::Error),
    #[error(transparent)]
    Network(#[from] NetworkError),
}

// endregion Conversions

#[cfg(test)]
mod json_tests {
    use super::*;
    use std::path::PathBuf;

    fn toy_model_path() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("test_data")
            .join("toy_model.json")
    }

    #[test]
    fn json_reaction() {
        let data = r#"{
"id":"PFK",
"name":"Phosphofructokinase",
"metabolites":{"atp_c":-1.0,"f6p_c":-1.0,"adp_c":1.0,"fdp_c":1.0},
"notes":{"original_bigg_ids":["PFK"]}
}"#;
        let reaction: JsonReaction = serde_json::from_str(data).unwrap();
        assert_eq!(reaction.id, "PFK");
        assert_eq!(reaction.name.unwrap(), "Phosphofructokinase");
        assert!((reaction.metabolites["atp_c"] + 1.).abs() < 1e-25);
        assert!((reaction.lower_bound - 0.).abs() < 1e-25);
        assert!((reaction.upper_bound - 1000.).abs() < 1e-25);
        assert!(reaction.gene_reaction_rule.is_empty());
    }

    #[test]
    fn read_json_fixture() {
        let network = read_json(toy_model_path()).unwrap();
        assert_eq!(network.n_reactions(), 4);
        assert_eq!(network.n_metabolites(), 3);
        assert_eq!(network.reaction_name(0), Some("R1"));
        assert_eq!(network.metabolite(1).unwrap().name.as_deref(), Some("B"));
        // R1: A --> 2 B
        let b = network.metabolite(1).unwrap();
        assert!((b.signed_coefficient(0) - 2.).abs() < 1e-25);
        assert!((network.metabolite(0).unwrap().signed_coefficient(0) + 1.).abs() < 1e-25);
    }

    #[test]
    fn undeclared_metabolite() {
        let data = r#"{"metabolites":[{"id":"A"}],
"reactions":[{"id":"R1","metabolites":{"A":-1,"B":1}}]}"#;
        match parse_json_network(data) {
            Err(JsonError::UnknownMetabolite {
                reaction,
                metabolite,
            }) => {
                assert_eq!(reaction, "R1");
                assert_eq!(metabolite, "B");
            }
            _ => panic!("Undeclared metabolite not caught"),
        }
    }

    #[test]
    fn reversible_reaction_kept() {
        let data = r#"{"metabolites":[{"id":"A"},{"id":"B"}],
"reactions":[{"id":"R1","metabolites":{"A":-1,"B":1},"lower_bound":-1000}]}"#;
        let network = parse_json_network(data).unwrap();
        assert_eq!(network.n_reactions(), 1);
        assert_eq!(network.metabolite(0).unwrap().input.n_react(), 1);
    }

    #[test]
    fn malformed_json() {
        match parse_json_network("{\"reactions\": [{\"id\": 3}]}") {
            Err(JsonError::UnableToParse(_)) => {}
            _ => panic!("Malformed json not caught"),
        }
    }

    #[test]
    fn to_json_collapses_sides() {
        let network = read_json(toy_model_path()).unwrap();
        let json_model = to_json(&network);
        assert_eq!(json_model.metabolites.len(), 3);
        let reaction = json_model.reactions.first().unwrap();
        assert_eq!(reaction.id, "R1");
        let mut expected: IndexMap<String, f64> = IndexMap::new();
        expected.insert("A".to_string(), -1.);
        expected.insert("B".to_string(), 2.);
        assert_eq!(reaction.metabolites.len(), expected.len());
        for (k, v) in &reaction.metabolites {
            assert!((v - expected.get(k).unwrap()).abs() < 1e-25);
        }
    }

    #[test]
    fn write_then_read() {
        let network = read_json(toy_model_path()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("toy.json");
        write_json(&network, &path).unwrap();
        let reread = read_json(&path).unwrap();
        assert!(reread.is_isomorphic_to(&network));
        assert_eq!(reread.reaction_name(3), Some("R4"));
    }
}
