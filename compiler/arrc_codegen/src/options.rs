//! Code generation options.

/// Knobs for one compilation session.
///
/// Built with `Default` plus the `with_*` methods.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodegenOptions {
    /// Inline scalar expressions at their use instead of assigning each to a
    /// temporary, and turn assignments into temporaries into renames.
    pub min_temps: bool,
    /// Emit `ARRAYBOUNDSCHECK` before array accesses not marked in-bounds.
    pub bounds_check: bool,
    /// Emit `# line "file"` directives for line markers.
    pub line_directives: bool,
    /// Module assumed for calls whose module binding is unknown.
    pub fallback_namespace: String,
    /// Include targets, written verbatim after `#include `.
    pub includes: Vec<String>,
    /// Byte capacity of the code arena. Identifiers get an eighth of it.
    pub code_capacity: usize,
    /// Longest representative chain accepted before reporting a cycle.
    pub max_alias_chain: usize,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        CodegenOptions {
            min_temps: true,
            bounds_check: true,
            line_directives: true,
            fallback_namespace: "Base".to_owned(),
            includes: [
                "<omp.h>",
                "<stdint.h>",
                "<stdbool.h>",
                "<stdlib.h>",
                "<string.h>",
                "<assert.h>",
                "<math.h>",
                "\"pse-types.h\"",
                "\"pse-types.c\"",
            ]
            .iter()
            .map(|s| (*s).to_owned())
            .collect(),
            code_capacity: 64 << 20,
            max_alias_chain: 1024,
        }
    }
}

impl CodegenOptions {
    #[must_use]
    pub fn with_min_temps(mut self, min_temps: bool) -> Self {
        self.min_temps = min_temps;
        self
    }

    #[must_use]
    pub fn with_bounds_check(mut self, bounds_check: bool) -> Self {
        self.bounds_check = bounds_check;
        self
    }

    #[must_use]
    pub fn with_line_directives(mut self, line_directives: bool) -> Self {
        self.line_directives = line_directives;
        self
    }

    #[must_use]
    pub fn with_fallback_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.fallback_namespace = namespace.into();
        self
    }

    /// Replace the runtime header pair with `<dir>/pse-types.{h,c}`.
    #[must_use]
    pub fn with_runtime_dir(mut self, dir: &str) -> Self {
        self.includes.retain(|inc| !inc.contains("pse-types"));
        self.includes.push(format!("\"{dir}/pse-types.h\""));
        self.includes.push(format!("\"{dir}/pse-types.c\""));
        self
    }

    #[must_use]
    pub fn with_includes(mut self, includes: Vec<String>) -> Self {
        self.includes = includes;
        self
    }

    #[must_use]
    pub fn with_code_capacity(mut self, bytes: usize) -> Self {
        self.code_capacity = bytes;
        self
    }

    #[must_use]
    pub fn with_max_alias_chain(mut self, steps: usize) -> Self {
        self.max_alias_chain = steps;
        self
    }
}
