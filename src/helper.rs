// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fs::copy;
use std::fs::create_dir_all;
use std::path::Path;
use std::path::PathBuf;

use tempfile::tempdir;

use crate::collection::DATABASE_FILE;
use crate::error::Fallible;

/// Copy the `test` notes directory, minus any database, into a fresh
/// temporary directory and return its path.
pub fn create_tmp_copy_of_test_directory() -> Fallible<String> {
    let source: PathBuf = PathBuf::from("./test").canonicalize()?;
    let target: PathBuf = tempdir()?.keep().canonicalize()?;
    copy_dir(&source, &target)?;
    Ok(target.display().to_string())
}

fn copy_dir(source: &Path, target: &Path) -> Fallible<()> {
    create_dir_all(target)?;
    for entry in source.read_dir()? {
        let entry = entry?;
        let path = entry.path();
        let target_path = target.join(entry.file_name());
        if path.is_dir() {
            copy_dir(&path, &target_path)?;
        } else if entry.file_name() != DATABASE_FILE {
            copy(&path, &target_path)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_tmp_copy_of_test_directory() -> Fallible<()> {
        let directory = PathBuf::from(create_tmp_copy_of_test_directory()?);
        assert!(directory.join("geography.md").exists());
        assert!(directory.join("languages").join("rust.md").exists());
        assert!(!directory.join(DATABASE_FILE).exists());
        Ok(())
    }
}
