//! Assignment of sections to output files.

use super::{
    delimiter_file_name, new_table_delimiter_file_name, new_table_file_name, parse_section_number,
    section_file_name, ExistingFileInfo, OutputBasis, OutputPlan, OutputResource, OutputSettings,
    NEW_TABLE_NAME, NEW_TABLE_SECTION,
};
use crate::schema::{Schema, TableId};
use crate::section::{derive_main_name, Section};
use ahash::AHashMap;
use std::path::{Path, PathBuf};

/// Synthetic section numbers for existing files whose name carries none.
///
/// Numbers start above every number parsed from the other files and never hit
/// the new-table section.
#[derive(Debug)]
struct FallbackCounter {
    next: u32,
}

impl FallbackCounter {
    fn starting_after(highest: u32) -> Self {
        Self { next: highest + 1 }
    }

    fn next(&mut self) -> u32 {
        if self.next == NEW_TABLE_SECTION {
            self.next += 1;
        }
        let number = self.next;
        self.next += 1;
        number
    }
}

/// Builds the file plan for a list of sections
pub struct OutputFileOrderer<'s> {
    schema: &'s Schema,
    settings: &'s OutputSettings,
}

impl<'s> OutputFileOrderer<'s> {
    pub fn new(schema: &'s Schema, settings: &'s OutputSettings) -> Self {
        Self { schema, settings }
    }

    /// Fresh numbering: sections become `01`, `02`, ... in order
    pub fn replace(&self, sections: &[Section]) -> OutputPlan {
        let mut plan = OutputPlan::default();
        for (i, section) in sections.iter().enumerate() {
            let number = i as u32 + 1;
            match self.settings.basis {
                OutputBasis::Spreadsheet => {
                    let file_name = section_file_name(
                        &self.settings.title,
                        number,
                        &section.main_name,
                        &self.settings.extension,
                    );
                    plan.resources.push(OutputResource {
                        path: self.settings.dir.join(file_name),
                        section: Section {
                            number,
                            ..section.clone()
                        },
                        existing: false,
                    });
                }
                OutputBasis::Delimiter => {
                    for (sheet, &id) in section.tables.iter().enumerate() {
                        let file_name = delimiter_file_name(
                            &self.settings.title,
                            number,
                            sheet as u32 + 1,
                            &self.display_name(id),
                        );
                        plan.resources.push(OutputResource {
                            path: self.settings.dir.join(file_name),
                            section: Section::new(number, section.main_name.clone(), vec![id]),
                            existing: false,
                        });
                    }
                }
            }
        }
        plan
    }

    /// Reconcile with files from a previous run.
    ///
    /// Tables are visited in dependency order; each one joins the first existing
    /// file that holds it. Tables no file knows go to section 99. Existing files
    /// keep the table order recorded in them.
    pub fn override_existing(&self, sections: &[Section], existing: &ExistingFileInfo) -> OutputPlan {
        let mut plan = OutputPlan::default();
        let mut index: AHashMap<PathBuf, usize> = AHashMap::new();
        let mut new_tables: Vec<TableId> = Vec::new();
        let highest = sections
            .iter()
            .flat_map(|s| s.tables.iter())
            .filter_map(|&id| self.schema.table(id).and_then(|t| existing.file_for(t)))
            .filter_map(|path| self.parsed_section_number(path))
            .filter(|&number| number != NEW_TABLE_SECTION)
            .max()
            .unwrap_or(0);
        let mut counter = FallbackCounter::starting_after(highest);

        for &id in sections.iter().flat_map(|s| s.tables.iter()) {
            let Some(path) = self.schema.table(id).and_then(|t| existing.file_for(t)) else {
                new_tables.push(id);
                continue;
            };

            let slot = *index.entry(path.clone()).or_insert_with(|| {
                let number = self.existing_section_number(path, &mut counter);
                plan.resources.push(OutputResource {
                    path: path.clone(),
                    section: Section::new(number, String::new(), Vec::new()),
                    existing: true,
                });
                plan.resources.len() - 1
            });
            plan.resources[slot].section.tables.push(id);
        }

        for resource in &mut plan.resources {
            let names: Vec<&str> = resource
                .section
                .tables
                .iter()
                .map(|&id| self.schema.table_name(id))
                .collect();
            resource.section.main_name = derive_main_name(&names);
        }

        if !new_tables.is_empty() {
            tracing::info!(tables = new_tables.len(), "placing new tables in section 99");
            self.place_new_tables(&mut plan, &mut index, new_tables);
        }

        for resource in plan.resources.iter_mut().filter(|r| r.existing) {
            if let Some(order) = existing.recorded_order(&resource.path) {
                resource.section.table_order = Some(order);
            }
        }

        plan
    }

    fn place_new_tables(
        &self,
        plan: &mut OutputPlan,
        index: &mut AHashMap<PathBuf, usize>,
        new_tables: Vec<TableId>,
    ) {
        let title = &self.settings.title;
        match self.settings.basis {
            OutputBasis::Delimiter => {
                for id in new_tables {
                    let path = self
                        .settings
                        .dir
                        .join(new_table_delimiter_file_name(title, &self.display_name(id)));
                    self.attach_new(plan, index, path, vec![id]);
                }
            }
            OutputBasis::Spreadsheet => {
                let path = self
                    .settings
                    .dir
                    .join(new_table_file_name(title, &self.settings.extension));
                self.attach_new(plan, index, path, new_tables);
            }
        }
    }

    /// Add to the resource already bound to `path`, or create a section-99 one
    fn attach_new(
        &self,
        plan: &mut OutputPlan,
        index: &mut AHashMap<PathBuf, usize>,
        path: PathBuf,
        tables: Vec<TableId>,
    ) {
        match index.get(&path) {
            Some(&slot) => plan.resources[slot].section.tables.extend(tables),
            None => {
                index.insert(path.clone(), plan.resources.len());
                plan.resources.push(OutputResource {
                    path,
                    section: Section::new(NEW_TABLE_SECTION, NEW_TABLE_NAME, tables),
                    existing: false,
                });
            }
        }
    }

    fn parsed_section_number(&self, path: &Path) -> Option<u32> {
        let file_name = path.file_name().and_then(|n| n.to_str())?;
        parse_section_number(file_name, self.settings.basis)
    }

    fn existing_section_number(&self, path: &Path, counter: &mut FallbackCounter) -> u32 {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        match self.parsed_section_number(path) {
            Some(number) => number,
            None => {
                let number = counter.next();
                tracing::warn!(
                    file = file_name,
                    fallback = number,
                    "no section number in existing file name, using fallback"
                );
                number
            }
        }
    }

    fn display_name(&self, id: TableId) -> String {
        self.schema
            .table(id)
            .map(|t| t.display_name())
            .unwrap_or_default()
    }
}
