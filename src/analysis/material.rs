//! Material names, family classification and characteristic strength.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::model::material::material_name;
use crate::model::{IfcModel, MaterialDef, Property, PropertyContainer};
use crate::parser::StepValue;

/// Ordered family rules; the first rule with a keyword found in the joined,
/// lower-cased material names wins.
pub const FAMILY_RULES: &[(&str, &[&str])] = &[
    ("Concrete", &["betong", "concrete", "c20", "c25", "c30", "c35", "c40", "c45", "c50"]),
    ("Steel", &["stål", "steel", "s235", "s275", "s355", "s420", "s460"]),
    ("Wood", &["tre", "wood", "timber", "glulam", "lvl", "kerto", "c24"]),
    ("Masonry", &["mur", "masonry", "brick", "block", "tegl"]),
    ("Aluminium", &["aluminium", "aluminum", "alu"]),
    ("Glass", &["glass"]),
    ("Gypsum", &["gips", "gypsum"]),
    ("Insulation", &["isolasjon", "insulation", "xps", "eps", "rockwool", "mineral wool"]),
    ("Plastic", &["plast", "hdpe", "pp", "pvc"]),
    ("Asphalt", &["asfalt", "asphalt"]),
];

pub const UNKNOWN_FAMILY: &str = "Unknown";

const STRENGTH_PROPERTY_NAMES: &[&str] = &["compressivestrength", "fck", "fc", "fck_cyl", "fck_cube"];

/// Eurocode grade notation such as `C30/37` or `C 25`.
static GRADE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bC\s*([0-9]{2})(?:\s*/\s*[0-9]{2})?\b").expect("grade pattern is valid")
});

/// Which strategy produced the characteristic strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StrengthSource {
    Pset,
    Name,
    Default,
}

impl fmt::Display for StrengthSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StrengthSource::Pset => "pset",
            StrengthSource::Name => "name",
            StrengthSource::Default => "default",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialInfo {
    pub names: Vec<String>,
    pub family: String,
    /// N/mm²
    pub strength: f64,
    pub strength_source: StrengthSource,
}

impl MaterialInfo {
    /// Up to two material names for display.
    #[must_use]
    pub fn short_names(&self) -> String {
        if self.names.is_empty() {
            "<unknown>".to_string()
        } else {
            self.names
                .iter()
                .take(2)
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        }
    }
}

/// Context the strength strategies need besides the material definition.
#[derive(Debug, Clone, Copy)]
pub struct StrengthContext {
    pub default_strength: f64,
}

/// Resolves material names, family and strength for an element.
#[must_use]
pub fn resolve_material(model: &IfcModel, element: u64, context: StrengthContext) -> MaterialInfo {
    let definition = relating_material(model, element);
    let names = definition
        .as_ref()
        .map(|def| material_names(model, def))
        .unwrap_or_default();
    let family = classify_family(&names).to_string();

    let (strength, strength_source) =
        resolve_strength(model, definition.as_ref(), &names, &family, context);

    tracing::debug!(
        element,
        family = %family,
        strength,
        source = %strength_source,
        "Resolved material"
    );

    MaterialInfo {
        names,
        family,
        strength,
        strength_source,
    }
}

/// Material association on the element, otherwise on its type.
#[must_use]
pub fn relating_material(model: &IfcModel, element: u64) -> Option<MaterialDef> {
    let id = model
        .material_association(element)
        .or_else(|| model.type_of(element).and_then(|t| model.material_association(t)))?;
    MaterialDef::decode(model, id)
}

/// Flat, de-duplicated, order-preserving material names.
#[must_use]
pub fn material_names(model: &IfcModel, definition: &MaterialDef) -> Vec<String> {
    let Some(resolved) = definition.clone().resolve_usage(model) else {
        return Vec::new();
    };

    let mut names: Vec<String> = Vec::new();
    for name in resolved
        .material_ids()
        .into_iter()
        .filter_map(|id| material_name(model, id))
    {
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Family label from the ordered rule table.
#[must_use]
pub fn classify_family<S: AsRef<str>>(names: &[S]) -> &'static str {
    let text = names
        .iter()
        .map(|n| n.as_ref().to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");

    FAMILY_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
        .map_or(UNKNOWN_FAMILY, |(family, _)| family)
}

fn resolve_strength(
    model: &IfcModel,
    definition: Option<&MaterialDef>,
    names: &[String],
    family: &str,
    context: StrengthContext,
) -> (f64, StrengthSource) {
    let strategies: [(StrengthSource, &dyn Fn() -> Option<f64>); 3] = [
        (StrengthSource::Pset, &|| {
            definition.and_then(|def| strength_from_properties(model, def))
        }),
        (StrengthSource::Name, &|| strength_from_name(names, family)),
        (StrengthSource::Default, &|| Some(context.default_strength)),
    ];

    strategies
        .iter()
        .find_map(|(source, strategy)| strategy().map(|value| (value, *source)))
        .unwrap_or((context.default_strength, StrengthSource::Default))
}

/// Structured property search over every container reachable from the
/// definition. Concrete-named containers are searched first.
///
/// The number is taken as written, whatever measure type or project unit
/// surrounds it.
#[must_use]
pub fn strength_from_properties(model: &IfcModel, definition: &MaterialDef) -> Option<f64> {
    let containers: Vec<PropertyContainer> = reachable_containers(model, definition)
        .into_iter()
        .filter_map(|id| PropertyContainer::decode(model, id))
        .collect();

    let concrete_first = containers.iter().filter(|c| {
        let name = c.search_name();
        name.contains("pset_materialconcrete") || name.contains("concrete")
    });

    concrete_first
        .chain(containers.iter())
        .find_map(|container| strength_in_container(model, container))
}

/// Container ids: the definition's own, the set behind a usage, then each
/// material of the set.
fn reachable_containers(model: &IfcModel, definition: &MaterialDef) -> Vec<u64> {
    let mut ids: Vec<u64> = model.material_property_containers(definition.id()).to_vec();

    let resolved = definition.clone().resolve_usage(model);
    if let Some(set) = resolved.as_ref().filter(|set| set.id() != definition.id()) {
        ids.extend_from_slice(model.material_property_containers(set.id()));
    }
    if let Some(set) = resolved.as_ref() {
        for material in set.material_ids() {
            if material != definition.id() {
                ids.extend_from_slice(model.material_property_containers(material));
            }
        }
    }

    let mut seen = std::collections::HashSet::new();
    ids.retain(|id| seen.insert(*id));
    ids
}

fn strength_in_container(model: &IfcModel, container: &PropertyContainer) -> Option<f64> {
    match container {
        PropertyContainer::MechanicalConcrete {
            compressive_strength,
            ..
        } => *compressive_strength,
        PropertyContainer::Named { properties, .. } => properties
            .iter()
            .filter_map(|id| Property::decode(model, *id))
            .filter(|p| is_strength_property(p.name()))
            .find_map(|p| match p {
                Property::SingleValue { value, .. } => value.as_ref().and_then(numeric_value),
                Property::ListValue { values, .. } => values.first().and_then(numeric_value),
                Property::Other { .. } => None,
            }),
    }
}

fn is_strength_property(name: &str) -> bool {
    let normalized: String = name
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();
    STRENGTH_PROPERTY_NAMES.contains(&normalized.as_str())
}

fn numeric_value(value: &StepValue) -> Option<f64> {
    match value {
        StepValue::String(s) => s.trim().parse().ok(),
        other => other.as_real(),
    }
}

/// Grade encoded in concrete material names, e.g. `C30/37` gives 30.
#[must_use]
pub fn strength_from_name<S: AsRef<str>>(names: &[S], family: &str) -> Option<f64> {
    if family != "Concrete" || names.is_empty() {
        return None;
    }
    let text = names
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase();

    GRADE_PATTERN
        .captures(&text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::model_from_str;
    use pretty_assertions::assert_eq;

    const CONTEXT: StrengthContext = StrengthContext {
        default_strength: 35.0,
    };

    fn model(body: &str) -> IfcModel {
        model_from_str(&format!("DATA;\n{body}\nENDSEC;"), "material.ifc".to_string()).unwrap()
    }

    #[test]
    fn family_rule_order_is_pinned() {
        let families: Vec<&str> = FAMILY_RULES.iter().map(|(f, _)| *f).collect();
        assert_eq!(
            families,
            vec![
                "Concrete", "Steel", "Wood", "Masonry", "Aluminium", "Glass", "Gypsum",
                "Insulation", "Plastic", "Asphalt"
            ]
        );
    }

    #[test]
    fn concrete_rule_wins_over_steel() {
        assert_eq!(classify_family(&["Fireproofed Steel Concrete Composite"]), "Concrete");
        assert_eq!(classify_family(&["Steel S355"]), "Steel");
        assert_eq!(classify_family(&["Limtre GL30c"]), "Wood");
        assert_eq!(classify_family(&["Default"]), "Unknown");
        let empty: [&str; 0] = [];
        assert_eq!(classify_family(&empty), "Unknown");
    }

    #[test]
    fn grade_from_name() {
        assert_eq!(strength_from_name(&["Betong B35 C30/37"], "Concrete"), Some(30.0));
        assert_eq!(strength_from_name(&["Concrete C 45"], "Concrete"), Some(45.0));
        assert_eq!(strength_from_name(&["Concrete C30/37"], "Steel"), None);
        assert_eq!(strength_from_name(&["Concrete"], "Concrete"), None);
    }

    #[test]
    fn names_from_profile_set_usage_are_deduplicated() {
        let m = model(
            "#1=IFCMATERIAL('Concrete C30/37',$,$);
             #2=IFCMATERIAL('Steel',$,$);
             #3=IFCMATERIALPROFILE($,$,#1,$,$,$);
             #4=IFCMATERIALPROFILE($,$,#2,$,$,$);
             #5=IFCMATERIALPROFILE($,$,#1,$,$,$);
             #6=IFCMATERIALPROFILESET('S',$,(#3,#4,#5),$);
             #7=IFCMATERIALPROFILESETUSAGE(#6,$,$);",
        );
        let def = MaterialDef::decode(&m, 7).unwrap();
        assert_eq!(material_names(&m, &def), vec!["Concrete C30/37", "Steel"]);
    }

    #[test]
    fn names_from_layer_and_constituent_sets() {
        let m = model(
            "#1=IFCMATERIAL('Tegl',$,$);
             #2=IFCMATERIAL('Mineral wool',$,$);
             #3=IFCMATERIALLAYER(#1,100.,$,$,$,$,$);
             #4=IFCMATERIALLAYER(#2,50.,$,$,$,$,$);
             #5=IFCMATERIALLAYERSET((#3,#4),'Wall',$);
             #6=IFCMATERIALLAYERSETUSAGE(#5,.AXIS2.,.POSITIVE.,0.,$);
             #7=IFCMATERIALCONSTITUENT('a',$,#2,$,$);
             #8=IFCMATERIALCONSTITUENTSET('C',$,(#7));",
        );
        let usage = MaterialDef::decode(&m, 6).unwrap();
        assert_eq!(material_names(&m, &usage), vec!["Tegl", "Mineral wool"]);
        let constituents = MaterialDef::decode(&m, 8).unwrap();
        assert_eq!(material_names(&m, &constituents), vec!["Mineral wool"]);
    }

    #[test]
    fn type_association_is_the_fallback() {
        let m = model(
            "#1=IFCMATERIAL('Concrete C25/30',$,$);
             #10=IFCCOLUMN('c',$,$,$,$,$,$,$,$);
             #11=IFCCOLUMNTYPE('t',$,'T',$,$,$,$,$,$,.COLUMN.);
             #12=IFCRELDEFINESBYTYPE('r',$,$,$,(#10),#11);
             #13=IFCRELASSOCIATESMATERIAL('m',$,$,$,(#11),#1);",
        );
        let info = resolve_material(&m, 10, CONTEXT);
        assert_eq!(info.names, vec!["Concrete C25/30"]);
        assert_eq!(info.family, "Concrete");
        assert_eq!(info.strength, 25.0);
        assert_eq!(info.strength_source, StrengthSource::Name);
    }

    #[test]
    fn property_set_beats_name_grade() {
        let m = model(
            "#1=IFCMATERIAL('Concrete C30/37',$,$);
             #2=IFCPROPERTYSINGLEVALUE('fck',$,IFCPRESSUREMEASURE(45.),$);
             #3=IFCMATERIALPROPERTIES('Pset_MaterialConcrete',$,(#2),#1);
             #10=IFCCOLUMN('c',$,$,$,$,$,$,$,$);
             #11=IFCRELASSOCIATESMATERIAL('m',$,$,$,(#10),#1);",
        );
        let info = resolve_material(&m, 10, CONTEXT);
        assert_eq!(info.strength, 45.0);
        assert_eq!(info.strength_source, StrengthSource::Pset);
    }

    #[test]
    fn concrete_containers_are_searched_first() {
        let m = model(
            "#1=IFCMATERIAL('Composite',$,$);
             #2=IFCPROPERTYSINGLEVALUE('fc',$,IFCREAL(20.),$);
             #3=IFCMATERIALPROPERTIES('Pset_Generic',$,(#2),#1);
             #4=IFCPROPERTYSINGLEVALUE('Compressive Strength',$,IFCREAL(40.),$);
             #5=IFCMATERIALPROPERTIES('Pset_MaterialConcrete',$,(#4),#1);",
        );
        let def = MaterialDef::decode(&m, 1).unwrap();
        assert_eq!(strength_from_properties(&m, &def), Some(40.0));
    }

    #[test]
    fn per_material_properties_behind_a_usage() {
        let m = model(
            "#1=IFCMATERIAL('Betong',$,$);
             #2=IFCMATERIALPROFILE($,$,#1,$,$,$);
             #3=IFCMATERIALPROFILESET('S',$,(#2),$);
             #4=IFCMATERIALPROFILESETUSAGE(#3,$,$);
             #5=IFCPROPERTYLISTVALUE('fck_cyl',$,(IFCREAL(35.),IFCREAL(45.)),$);
             #6=IFCMATERIALPROPERTIES('Strength',$,(#5),#1);",
        );
        let def = MaterialDef::decode(&m, 4).unwrap();
        assert_eq!(strength_from_properties(&m, &def), Some(35.0));
    }

    #[test]
    fn declared_pressure_unit_leaves_values_unscaled() {
        let m = model(
            "#1=IFCMATERIAL('Concrete',$,$);
             #2=IFCPROPERTYSINGLEVALUE('fck',$,IFCREAL(35.),$);
             #3=IFCMATERIALPROPERTIES('Pset_MaterialConcrete',$,(#2),#1);
             #4=IFCSIUNIT(*,.PRESSUREUNIT.,$,.PASCAL.);
             #5=IFCSIUNIT(*,.LENGTHUNIT.,.MILLI.,.METRE.);
             #6=IFCUNITASSIGNMENT((#4,#5));
             #7=IFCPROJECT('p',$,'P',$,$,$,$,$,#6);
             #10=IFCCOLUMN('c',$,$,$,$,$,$,$,$);
             #11=IFCRELASSOCIATESMATERIAL('m',$,$,$,(#10),#1);",
        );
        let info = resolve_material(&m, 10, CONTEXT);
        assert_eq!(info.strength, 35.0);
        assert_eq!(info.strength_source, StrengthSource::Pset);
    }

    #[test]
    fn label_values_are_parsed_as_written() {
        let m = model(
            "#1=IFCMATERIAL('Concrete',$,$);
             #2=IFCPROPERTYSINGLEVALUE('CompressiveStrength',$,IFCLABEL(' 40 '),$);
             #3=IFCMATERIALPROPERTIES('Pset_MaterialConcrete',$,(#2),#1);
             #4=IFCSIUNIT(*,.PRESSUREUNIT.,$,.PASCAL.);
             #5=IFCUNITASSIGNMENT((#4));",
        );
        let def = MaterialDef::decode(&m, 1).unwrap();
        assert_eq!(strength_from_properties(&m, &def), Some(40.0));
    }

    #[test]
    fn large_values_are_not_reinterpreted() {
        let m = model(
            "#1=IFCMATERIAL('Concrete',$,$);
             #2=IFCPROPERTYSINGLEVALUE('fck',$,IFCREAL(35000.),$);
             #3=IFCMATERIALPROPERTIES('Pset_MaterialConcrete',$,(#2),#1);",
        );
        let def = MaterialDef::decode(&m, 1).unwrap();
        assert_eq!(strength_from_properties(&m, &def), Some(35000.0));
    }

    #[test]
    fn ifc2x3_mechanical_concrete_properties() {
        let m = model(
            "#1=IFCMATERIAL('Concrete',$,$);
             #2=IFCMECHANICALCONCRETEMATERIALPROPERTIES(#1,$,$,$,$,$,30.,$,$,$,$);",
        );
        let def = MaterialDef::decode(&m, 1).unwrap();
        assert_eq!(strength_from_properties(&m, &def), Some(30.0));
    }

    #[test]
    fn default_when_nothing_is_found() {
        let m = model("#10=IFCCOLUMN('c',$,$,$,$,$,$,$,$);");
        let info = resolve_material(&m, 10, CONTEXT);
        assert!(info.names.is_empty());
        assert_eq!(info.family, "Unknown");
        assert_eq!(info.strength, 35.0);
        assert_eq!(info.strength_source, StrengthSource::Default);
        assert_eq!(info.short_names(), "<unknown>");
    }
}
