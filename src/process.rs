use std::{
    collections::HashMap,
    env,
    ffi::{OsStr, OsString},
    path::PathBuf,
    process::ExitStatus,
};

use tokio::process::Command;
use tracing::{info, instrument};

use crate::{auth::LaunchOptions, file::Hierarchy, metadata::game::VersionInfo, sync};

/// Replaces every `${name}` in `arg`; unknown names become empty.
fn substitute_arg(arg: &str, params: &HashMap<&str, OsString>) -> OsString {
    let mut output = OsString::new();
    let mut rest = arg;
    while let Some(i) = rest.find("${") {
        let Some(j) = rest[i..].find('}') else {
            break;
        };
        output.push(&rest[..i]);
        if let Some(replacement) = params.get(&rest[i + 2..i + j]) {
            output.push(replacement);
        }
        rest = &rest[i + j + 1..];
    }
    output.push(rest);
    output
}

/// Command line of a resolved version, before placeholder substitution.
pub struct GameCommand<'a> {
    cwd: PathBuf,
    java_path: &'a OsStr,
    jvm_args: Vec<&'a str>,
    game_args: Vec<&'a str>,
    main_class: &'a str,
}

impl<'a> GameCommand<'a> {
    pub fn new(
        cwd: impl Into<PathBuf>,
        java_path: &'a OsStr,
        version: &'a VersionInfo,
        features: &HashMap<&str, bool>,
    ) -> Self {
        let jvm_args = version.iter_jvm_args(features).collect();
        let game_args = version.iter_game_args(features).collect();

        Self {
            cwd: cwd.into(),
            java_path,
            jvm_args,
            game_args,
            main_class: &version.main_class,
        }
    }

    pub fn jvm_arg(&mut self, arg: &'a str) {
        self.jvm_args.push(arg);
    }

    /// Program arguments in launch order.
    pub fn args(&self, params: &HashMap<&str, OsString>) -> Vec<OsString> {
        self.jvm_args
            .iter()
            .map(|arg| substitute_arg(arg, params))
            .chain([OsString::from(self.main_class)])
            .chain(self.game_args.iter().map(|arg| substitute_arg(arg, params)))
            .collect()
    }

    pub fn build(&self, params: &HashMap<&str, OsString>) -> Command {
        let mut command = Command::new(self.java_path);
        command.current_dir(&self.cwd);
        command.args(self.args(params));
        command
    }

    pub fn build_with_default_params(
        &self,
        hierarchy: &Hierarchy,
        version: &VersionInfo,
        options: &LaunchOptions,
    ) -> crate::Result<Command> {
        Ok(self.build(&default_params(hierarchy, version, options)?))
    }
}

/// Libraries allowed on this OS followed by the game jar.
pub fn classpath(hierarchy: &Hierarchy, version: &VersionInfo) -> crate::Result<OsString> {
    let mut entries = vec![];
    for lib in version
        .libraries
        .iter()
        .filter(|lib| lib.is_supported_by_rules())
    {
        if let Some(artifact) = lib.artifact()? {
            entries.push(hierarchy.library(&artifact.path));
        }
    }
    entries.push(hierarchy.version_jar(version.jar_id()));
    Ok(env::join_paths(entries)?)
}

pub fn default_params(
    hierarchy: &Hierarchy,
    version: &VersionInfo,
    options: &LaunchOptions,
) -> crate::Result<HashMap<&'static str, OsString>> {
    const LAUNCHER_NAME: &str = env!("CARGO_PKG_NAME");
    const LAUNCHER_VERSION: &str = env!("CARGO_PKG_VERSION");
    #[cfg(windows)]
    const CLASSPATH_SEPARATOR: &str = ";";
    #[cfg(not(windows))]
    const CLASSPATH_SEPARATOR: &str = ":";

    let mut params: HashMap<&str, OsString> = HashMap::new();
    params.insert("classpath", classpath(hierarchy, version)?);
    params.insert("classpath_separator", CLASSPATH_SEPARATOR.into());
    params.insert(
        "natives_directory",
        hierarchy.natives_dir(&version.id).into_os_string(),
    );
    params.insert("library_directory", hierarchy.libraries_dir.clone().into());
    params.insert("game_directory", hierarchy.gamedir.clone().into());
    params.insert("assets_root", hierarchy.assets_dir.clone().into());
    params.insert("game_assets", hierarchy.legacy_assets_dir().into());
    params.insert("assets_index_name", version.assets_id().into());
    params.insert("version_name", version.id.clone().into());
    params.insert(
        "version_type",
        version.release_type.as_deref().unwrap_or("release").into(),
    );
    params.insert("launcher_name", LAUNCHER_NAME.into());
    params.insert("launcher_version", LAUNCHER_VERSION.into());
    params.insert("auth_player_name", options.username.clone().into());
    params.insert("auth_uuid", options.uuid.simple().to_string().into());
    params.insert("auth_access_token", options.token.clone().into());
    params.insert("auth_session", options.token.clone().into());
    params.insert("auth_xuid", "0".into());
    params.insert("clientid", "".into());
    params.insert("user_type", options.user_type().into());
    params.insert("user_properties", "{}".into());
    if let Some(logging) = &version.logging {
        params.insert(
            "path",
            sync::log_config_path(hierarchy, &logging.client.config.id).into(),
        );
    }
    Ok(params)
}

/// Builds the launch command of an installed, resolved version.
pub fn launch_command(
    hierarchy: &Hierarchy,
    version: &VersionInfo,
    options: &LaunchOptions,
    java_path: &OsStr,
) -> crate::Result<Command> {
    let features = HashMap::new();
    let mut command = GameCommand::new(&hierarchy.gamedir, java_path, version, &features);
    if let Some(logging) = &version.logging {
        command.jvm_arg(&logging.client.argument);
    }
    command.build_with_default_params(hierarchy, version, options)
}

/// Runs the game and waits for it to exit.
#[instrument(skip(command))]
pub async fn run(mut command: Command) -> crate::Result<ExitStatus> {
    info!(?command, "Launching game");
    let status = command.spawn()?.wait().await?;
    info!(%status, "Game exited");
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> HashMap<&'static str, OsString> {
        HashMap::from([
            ("natives_directory", OsString::from("/natives")),
            ("auth_player_name", OsString::from("Steve")),
        ])
    }

    #[test]
    fn substitutes_all_placeholders() {
        assert_eq!(
            substitute_arg("-Djava.library.path=${natives_directory}", &params()),
            "-Djava.library.path=/natives"
        );
        assert_eq!(
            substitute_arg("${auth_player_name}@${natives_directory}", &params()),
            "Steve@/natives"
        );
        assert_eq!(substitute_arg("${unknown}", &params()), "");
        assert_eq!(substitute_arg("--demo", &params()), "--demo");
        assert_eq!(substitute_arg("${unterminated", &params()), "${unterminated");
    }

    const VERSION: &str = r#"{
        "id": "fabric-loader-0.16.5-1.20.1",
        "jar": "1.20.1",
        "type": "release",
        "assets": "5",
        "mainClass": "net.fabricmc.loader.impl.launch.knot.KnotClient",
        "arguments": {
            "game": ["--username", "${auth_player_name}", "--uuid", "${auth_uuid}",
                     "--accessToken", "${auth_access_token}", "--assetIndex", "${assets_index_name}"],
            "jvm": ["-cp", "${classpath}", "-DFabricMcEmu= net.minecraft.client.main.Main "]
        },
        "libraries": [
            {"name": "net.fabricmc:fabric-loader:0.16.5", "url": "https://maven.fabricmc.net/"},
            {"name": "org.lwjgl:lwjgl-freetype:3.3.1", "url": "https://libraries.minecraft.net/",
             "rules": [{"action": "allow", "os": {"name": "not-an-os"}}]}
        ]
    }"#;

    #[test]
    fn builds_launch_arguments() {
        let version: VersionInfo = serde_json::from_str(VERSION).unwrap();
        let hierarchy = Hierarchy::new("minecraft");
        let options = LaunchOptions::offline("Steve");
        let features = HashMap::new();
        let command = GameCommand::new(&hierarchy.gamedir, OsStr::new("java"), &version, &features);
        let args = command.args(&default_params(&hierarchy, &version, &options).unwrap());

        let expected_classpath = env::join_paths([
            hierarchy.library("net/fabricmc/fabric-loader/0.16.5/fabric-loader-0.16.5.jar"),
            hierarchy.version_jar("1.20.1"),
        ])
        .unwrap();
        let uuid = options.uuid.simple().to_string();
        let expected: Vec<OsString> = [
            OsStr::new("-cp"),
            expected_classpath.as_os_str(),
            OsStr::new("-DFabricMcEmu= net.minecraft.client.main.Main "),
            OsStr::new("net.fabricmc.loader.impl.launch.knot.KnotClient"),
            OsStr::new("--username"),
            OsStr::new("Steve"),
            OsStr::new("--uuid"),
            OsStr::new(&uuid),
            OsStr::new("--accessToken"),
            OsStr::new(""),
            OsStr::new("--assetIndex"),
            OsStr::new("5"),
        ]
        .iter()
        .map(|arg| arg.to_os_string())
        .collect();
        assert_eq!(args, expected);
    }

    #[test]
    fn command_runs_in_game_directory() {
        let version: VersionInfo = serde_json::from_str(VERSION).unwrap();
        let hierarchy = Hierarchy::new("minecraft");
        let command = launch_command(
            &hierarchy,
            &version,
            &LaunchOptions::offline("Steve"),
            OsStr::new("/usr/bin/java"),
        )
        .unwrap();
        let command = command.as_std();
        assert_eq!(command.get_program(), "/usr/bin/java");
        assert_eq!(
            command.get_current_dir(),
            Some(std::path::Path::new("minecraft"))
        );
    }
}
