//! Symbol rename transformer (spec §4.9 "Symbol rename").

use super::{Change, Context, Transformer};
use crate::error::{Error, Result};
use crate::ir::SymbolId;
use crate::transform::TransformResult;

/// Renames a Symbol's display name and every Reference to it.
pub struct SymbolRename {
    symbol_id: SymbolId,
    new_name: String,
}

impl SymbolRename {
    /// Rename `symbol_id` to `new_name`.
    pub fn new(symbol_id: SymbolId, new_name: impl Into<String>) -> Self {
        Self { symbol_id, new_name: new_name.into() }
    }
}

impl Transformer for SymbolRename {
    fn name(&self) -> &str {
        "rename"
    }

    fn description(&self) -> &str {
        "renames a symbol and every recorded reference to it"
    }

    fn validate(&self, ctx: &Context) -> Result<()> {
        if !is_valid_identifier(&self.new_name) {
            return Err(Error::ValidationFailed(format!("`{}` is not a valid identifier", self.new_name)));
        }
        ctx.index
            .get_symbol(&self.symbol_id)
            .ok_or_else(|| Error::SymbolNotFound(self.symbol_id.to_string()))?;
        Ok(())
    }

    fn transform(&self, ctx: &mut Context) -> Result<TransformResult> {
        let symbol = ctx
            .index
            .get_symbol(&self.symbol_id)
            .cloned()
            .ok_or_else(|| Error::SymbolNotFound(self.symbol_id.to_string()))?;

        let mut changes = vec![Change {
            file: symbol.file.clone(),
            start_line: symbol.range.start_line,
            start_col: symbol.range.start_col,
            end_line: symbol.range.end_line,
            end_col: symbol.range.end_col,
            original_text: symbol.name.clone(),
            new_text: self.new_name.clone(),
            affected_symbol: Some(symbol.id.clone()),
        }];
        let mut affected_files = vec![symbol.file.clone()];

        for reference in ctx.index.find_references(&symbol.id) {
            changes.push(Change {
                file: reference.file.clone(),
                start_line: reference.range.start_line,
                start_col: reference.range.start_col,
                end_line: reference.range.end_line,
                end_col: reference.range.end_col,
                original_text: symbol.name.clone(),
                new_text: self.new_name.clone(),
                affected_symbol: Some(symbol.id.clone()),
            });
            if !affected_files.contains(&reference.file) {
                affected_files.push(reference.file.clone());
            }
        }

        if !ctx.dry_run {
            if let Some(pkg) = ctx.module.packages.get_mut(&symbol.package) {
                if let Some(sym) = pkg.symbols.get_mut(&symbol.id) {
                    sym.name = self.new_name.clone();
                    sym.recompute_exported();
                }
            }
        }

        let reference_count = changes.len() - 1;
        Ok(TransformResult {
            summary: format!("renamed `{}` to `{}`", symbol.name, self.new_name),
            detail: format!("{reference_count} reference(s) updated across {} file(s)", affected_files.len()),
            success: true,
            dry_run: ctx.dry_run,
            error: None,
            affected_files,
            changes,
        })
    }
}

/// The source-language identifier rule: starts with a letter or
/// underscore, followed by letters, digits, or underscores.
fn is_valid_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}
