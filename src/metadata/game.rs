use std::{
    collections::{HashMap, HashSet},
    env::consts,
    iter,
    path::PathBuf,
};

use chrono::{DateTime, Utc};
use serde_derive::Deserialize;
use serde_with::{serde_as, OneOrMany};

use super::maven::Coordinate;

pub static LIBRARIES_URL: &str = "https://libraries.minecraft.net/";

const LEGACY_JVM_ARGS: [&str; 3] = [
    "-Djava.library.path=${natives_directory}",
    "-cp",
    "${classpath}",
];

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Disallow,
}

#[derive(Deserialize, Debug)]
pub struct OsDescription {
    pub name: Option<String>,
    // version patterns are not evaluated
    pub version: Option<String>,
    pub arch: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct Rule {
    pub action: RuleAction,
    pub os: Option<OsDescription>,
    pub features: Option<HashMap<String, bool>>,
}

#[derive(Deserialize, Debug)]
pub struct Rules(Vec<Rule>);

#[serde_as]
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum Argument {
    Plain(String),
    RuleSpecific {
        #[serde_as(deserialize_as = "OneOrMany<_>")]
        value: Vec<String>,
        rules: Rules,
    },
}

#[derive(Deserialize, Debug, Default)]
pub struct Arguments {
    #[serde(default)]
    pub game: Vec<Argument>,
    #[serde(default)]
    pub jvm: Vec<Argument>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Resource {
    pub sha1: String,
    pub size: u64,
    pub url: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AssetIndexResource {
    #[serde(flatten)]
    pub resource: Resource,
    pub id: String,
    pub total_size: u64,
}

#[derive(Deserialize, Debug)]
pub struct LoggerConfig {
    #[serde(flatten)]
    pub resource: Resource,
    pub id: String,
}

#[derive(Deserialize, Debug)]
pub struct LoggerDescription {
    pub argument: String,
    #[serde(rename = "type")]
    pub log_type: String,
    #[serde(rename = "file")]
    pub config: LoggerConfig,
}

#[derive(Deserialize, Debug)]
pub struct Logging {
    pub client: LoggerDescription,
}

#[derive(Deserialize, Debug)]
pub struct LibraryResource {
    #[serde(flatten)]
    pub resource: Resource,
    pub path: String,
}

#[derive(Deserialize, Debug)]
pub struct LibraryResources {
    pub artifact: Option<LibraryResource>,
    #[serde(rename = "classifiers")]
    pub other: Option<HashMap<String, LibraryResource>>,
}

#[derive(Deserialize, Debug)]
pub struct Library {
    pub name: String,
    #[serde(rename = "downloads")]
    pub resources: Option<LibraryResources>,
    /// Maven repository for libraries listed by name only.
    pub url: Option<String>,
    pub sha1: Option<String>,
    pub size: Option<u64>,
    pub rules: Option<Rules>,
    pub natives: Option<HashMap<String, String>>,
}

/// A library file resolved to its download location and path under `libraries/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryFile {
    pub url: String,
    pub path: PathBuf,
    pub sha1: Option<String>,
    pub size: Option<u64>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct JavaVersion {
    pub component: String,
    pub major_version: usize,
}

#[derive(Deserialize, Debug)]
pub struct Downloads {
    pub client: Resource,
    pub server: Option<Resource>,
}

/// Version JSON as found in `versions/<id>/<id>.json`.
///
/// Mod loader profiles only carry what they change and name their base
/// version in `inheritsFrom`; [`VersionInfo::inherit`] folds the base in.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    pub id: String,
    pub inherits_from: Option<String>,
    pub jar: Option<String>,
    #[serde(rename = "type")]
    pub release_type: Option<String>,
    pub minimum_launcher_version: Option<usize>,
    pub release_time: Option<DateTime<Utc>>,
    pub time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub libraries: Vec<Library>,
    pub downloads: Option<Downloads>,
    pub asset_index: Option<AssetIndexResource>,
    pub assets: Option<String>,
    #[serde(default)]
    pub main_class: String,
    pub arguments: Option<Arguments>,
    pub minecraft_arguments: Option<String>,

    pub java_version: Option<JavaVersion>,
    pub logging: Option<Logging>,
    pub compliance_level: Option<usize>,

    /// Id of the last ancestor folded in by [`VersionInfo::inherit`].
    #[serde(skip)]
    base_id: Option<String>,
}

fn os_name() -> &'static str {
    match consts::OS {
        "macos" => "osx",
        other => other,
    }
}

impl Rule {
    fn matches(&self, features: &HashMap<&str, bool>) -> bool {
        if let Some(os) = &self.os {
            if let Some(name) = &os.name {
                if name != os_name() {
                    return false;
                }
            }
            if let Some(arch) = &os.arch {
                if arch != consts::ARCH {
                    return false;
                }
            }
        }
        if let Some(required) = &self.features {
            for (k, v) in required.iter() {
                if features.get(k.as_str()).unwrap_or(&false) != v {
                    return false;
                }
            }
        }
        true
    }
}

impl Rules {
    /// Disallowed unless a rule allows it; the last matching rule decides.
    pub fn is_allowed(&self, features: &HashMap<&str, bool>) -> bool {
        self.0
            .iter()
            .filter(|rule| rule.matches(features))
            .last()
            .map(|rule| rule.action == RuleAction::Allow)
            .unwrap_or(false)
    }
}

impl Argument {
    /// Rules are evaluated up front, so the iterator only borrows `self`.
    pub fn iter_strings(
        &self,
        features: &HashMap<&str, bool>,
    ) -> Box<dyn Iterator<Item = &str> + '_> {
        match self {
            Self::Plain(s) => Box::new(iter::once(s.as_str())),
            Self::RuleSpecific { value, rules } => {
                if rules.is_allowed(features) {
                    Box::new(value.iter().map(String::as_str))
                } else {
                    Box::new(iter::empty())
                }
            }
        }
    }
}

impl Arguments {
    fn extend(mut self, child: Arguments) -> Self {
        self.game.extend(child.game);
        self.jvm.extend(child.jvm);
        self
    }
}

impl From<&LibraryResource> for LibraryFile {
    fn from(lib_res: &LibraryResource) -> Self {
        Self {
            url: lib_res.resource.url.clone(),
            path: PathBuf::from(&lib_res.path),
            sha1: Some(lib_res.resource.sha1.clone()),
            size: Some(lib_res.resource.size),
        }
    }
}

impl Library {
    pub fn is_supported_by_rules(&self) -> bool {
        self.rules
            .as_ref()
            .map(|rules| rules.is_allowed(&HashMap::new()))
            .unwrap_or(true)
    }

    /// Identity of the library regardless of its version.
    pub fn key(&self) -> String {
        match Coordinate::parse(&self.name) {
            Ok(coordinate) => match &coordinate.classifier {
                Some(classifier) => format!("{}:{}", coordinate.key(), classifier),
                None => coordinate.key(),
            },
            Err(_) => self.name.clone(),
        }
    }

    /// The jar that goes on the classpath, if the library has one.
    pub fn artifact(&self) -> crate::Result<Option<LibraryFile>> {
        match &self.resources {
            Some(resources) => Ok(resources.artifact.as_ref().map(LibraryFile::from)),
            None => {
                let coordinate = Coordinate::parse(&self.name)?;
                let repository = self.url.as_deref().unwrap_or(LIBRARIES_URL);
                Ok(Some(LibraryFile {
                    url: coordinate.url(repository),
                    path: coordinate.local_path(),
                    sha1: self.sha1.clone(),
                    size: self.size,
                }))
            }
        }
    }

    /// Legacy natives archive for the running OS.
    pub fn native_for_os(&self) -> Option<LibraryFile> {
        let classifiers = self.resources.as_ref()?.other.as_ref()?;
        let classifier = match &self.natives {
            Some(natives) => natives.get(os_name())?.replace(
                "${arch}",
                if cfg!(target_pointer_width = "64") {
                    "64"
                } else {
                    "32"
                },
            ),
            None => match consts::OS {
                "macos" if consts::ARCH == "aarch64" => "natives-macos-arm64",
                "linux" => "natives-linux",
                "windows" => "natives-windows",
                "macos" => "natives-macos",
                _ => return None,
            }
            .to_owned(),
        };
        classifiers.get(&classifier).map(LibraryFile::from)
    }
}

impl VersionInfo {
    /// Fold the version this one inherits from into it.
    ///
    /// Own libraries come first and shadow the parent's libraries with
    /// the same identity. Parent arguments precede own arguments.
    pub fn inherit(mut self, parent: VersionInfo) -> Self {
        let shadowed: HashSet<String> = self.libraries.iter().map(Library::key).collect();
        self.libraries.extend(
            parent
                .libraries
                .into_iter()
                .filter(|lib| !shadowed.contains(&lib.key())),
        );
        self.arguments = match (parent.arguments, self.arguments) {
            (Some(parent_args), Some(own)) => Some(parent_args.extend(own)),
            (parent_args, own) => own.or(parent_args),
        };
        if self.main_class.is_empty() {
            self.main_class = parent.main_class;
        }
        self.jar = self.jar.or(parent.jar);
        self.base_id = Some(parent.id);
        self.minecraft_arguments = self.minecraft_arguments.or(parent.minecraft_arguments);
        self.release_type = self.release_type.or(parent.release_type);
        self.downloads = self.downloads.or(parent.downloads);
        self.asset_index = self.asset_index.or(parent.asset_index);
        self.assets = self.assets.or(parent.assets);
        self.java_version = self.java_version.or(parent.java_version);
        self.logging = self.logging.or(parent.logging);
        self.inherits_from = parent.inherits_from;
        self
    }

    /// Id of the version whose jar is launched: an explicit `jar`, else the
    /// root of the inheritance chain.
    pub fn jar_id(&self) -> &str {
        self.jar
            .as_deref()
            .or(self.base_id.as_deref())
            .unwrap_or(&self.id)
    }

    pub fn assets_id(&self) -> &str {
        self.assets
            .as_deref()
            .or_else(|| self.asset_index.as_ref().map(|index| index.id.as_str()))
            .unwrap_or("legacy")
    }

    pub fn iter_jvm_args<'a: 'b, 'b>(
        &'a self,
        features: &'b HashMap<&'b str, bool>,
    ) -> Box<dyn Iterator<Item = &'a str> + 'b> {
        match &self.arguments {
            Some(arguments) if !arguments.jvm.is_empty() => Box::new(
                arguments
                    .jvm
                    .iter()
                    .flat_map(|argument| argument.iter_strings(features)),
            ),
            _ => Box::new(LEGACY_JVM_ARGS.into_iter()),
        }
    }

    pub fn iter_game_args<'a: 'b, 'b>(
        &'a self,
        features: &'b HashMap<&'b str, bool>,
    ) -> Box<dyn Iterator<Item = &'a str> + 'b> {
        match (&self.arguments, &self.minecraft_arguments) {
            (Some(arguments), _) if !arguments.game.is_empty() => Box::new(
                arguments
                    .game
                    .iter()
                    .flat_map(|argument| argument.iter_strings(features)),
            ),
            (_, Some(legacy)) => Box::new(legacy.split_whitespace()),
            _ => Box::new(iter::empty()),
        }
    }
}
