//! `docker run` invocation for executing inside a built image

use std::path::Path;

/// Mount point of the repository inside the container
pub const CONTAINER_WORKSPACE: &str = "/workspace";
/// Mount point of the optional data directory inside the container
pub const CONTAINER_DATA: &str = "/data";

/// Shell command running `command` in `image` with the repository mounted
/// at `/workspace` (the working directory) and `data_dir` at `/data`
///
/// `command` is handed to `sh -c` inside the container as a single quoted
/// argument, so compound command lines never reach the host shell.
pub fn container_command(
    repo_path: &Path,
    image: &str,
    command: &str,
    data_dir: Option<&Path>,
    gpu: bool,
) -> String {
    let mut parts = vec!["docker".to_string(), "run".to_string(), "--rm".to_string()];

    parts.push("-v".to_string());
    let workspace = format!("{}:{CONTAINER_WORKSPACE}", repo_path.display());
    parts.push(shell_words::quote(&workspace).into_owned());

    if let Some(data) = data_dir {
        parts.push("-v".to_string());
        let mount = format!("{}:{CONTAINER_DATA}", data.display());
        parts.push(shell_words::quote(&mount).into_owned());
    }

    if gpu {
        parts.push("--gpus".to_string());
        parts.push("all".to_string());
    }

    parts.push("-w".to_string());
    parts.push(CONTAINER_WORKSPACE.to_string());
    parts.push(shell_words::quote(image).into_owned());
    parts.push("sh".to_string());
    parts.push("-c".to_string());
    parts.push(shell_words::quote(command).into_owned());

    parts.join(" ")
}
