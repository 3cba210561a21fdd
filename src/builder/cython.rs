//! `.pyx` to `.c` translation.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::core::capability::{CythonCompiler, SourceSuffix};
use crate::core::extension::ExtensionDescriptor;
use crate::util::process::ProcessBuilder;

/// Runs the Cython compiler for one project.
#[derive(Debug, Clone)]
pub struct Cythonizer<'a> {
    compiler: &'a CythonCompiler,
    root: &'a Path,
}

impl<'a> Cythonizer<'a> {
    pub fn new(compiler: &'a CythonCompiler, root: &'a Path) -> Self {
        Cythonizer { compiler, root }
    }

    /// The command translating `source` into `output`.
    pub fn command(&self, ext: &ExtensionDescriptor, source: &Path, output: &Path) -> ProcessBuilder {
        let mut pb = ProcessBuilder::new(self.compiler.path()).cwd(self.root);
        for dir in ext.include_dirs() {
            pb = pb.arg("-I").arg(dir);
        }
        pb.arg(source).arg("-o").arg(output)
    }

    /// Translate every intermediate-form source of `ext`.
    ///
    /// Returns the generated paths, relative to the project root. Sources
    /// already in pre-generated form are left alone.
    pub fn translate(&self, ext: &ExtensionDescriptor) -> Result<Vec<PathBuf>> {
        let mut generated = Vec::new();

        for source in ext.sources() {
            if !is_intermediate(source) {
                continue;
            }
            let output = source.with_extension(SourceSuffix::PregeneratedForm.extension());
            let pb = self.command(ext, source, &output);
            tracing::debug!("running `{}`", pb.display_command());
            pb.exec_and_check()?;
            generated.push(output);
        }

        Ok(generated)
    }
}

fn is_intermediate(path: &Path) -> bool {
    path.extension()
        .is_some_and(|e| e == SourceSuffix::IntermediateForm.extension())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::manifest::ExtensionSpec;

    fn ext(suffix: SourceSuffix) -> ExtensionDescriptor {
        let spec = ExtensionSpec {
            name: "pkg._fast".into(),
            source: "fast".into(),
            subdir: "src".into(),
            include_dirs: vec![PathBuf::from("include")],
        };
        ExtensionDescriptor::from_spec("pkg", &spec, suffix)
    }

    #[test]
    fn test_command_line() {
        let compiler = CythonCompiler::new("cython");
        let root = Path::new("/proj");
        let cy = Cythonizer::new(&compiler, root);

        let pb = cy.command(
            &ext(SourceSuffix::IntermediateForm),
            Path::new("pkg/src/fast.pyx"),
            Path::new("pkg/src/fast.c"),
        );
        assert_eq!(
            pb.display_command(),
            "cython -I include pkg/src/fast.pyx -o pkg/src/fast.c"
        );
    }

    #[test]
    fn test_pregenerated_sources_are_not_translated() {
        let compiler = CythonCompiler::new("definitely-not-a-real-tool-xyz");
        let root = Path::new("/proj");
        let cy = Cythonizer::new(&compiler, root);

        let generated = cy.translate(&ext(SourceSuffix::PregeneratedForm)).unwrap();
        assert!(generated.is_empty());
    }
}
