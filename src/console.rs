//! Line-oriented front-end driving a [`ResultsView`].
//!
//! The console is the UI thread: it owns the view and the filter, drains
//! resolver completions between commands, and prints rows as they are
//! inserted. Commands are read one per line:
//!
//! ```text
//! filter <n> <key|-> [value]   edit rule n; '-' clears the key, '*' means any value
//! sort time|title              reorder and refresh
//! open <row>                   open the asset with the configured opener
//! url <row>                    print the drag-and-drop URL of the asset
//! rules                        list filter rules and known keys
//! quit
//! ```

use std::io::Write;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use hordebrowse_common::{CriterionValue, Generation, SortKey};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::filter::FilterCriteriaBuilder;
use crate::launcher::Launcher;
use crate::mount;
use crate::pipeline::{ResultsView, RowObserver};
use crate::presentation::ViewItem;

/// Prints rows as the collection grows.
pub struct Printer<W> {
    out: W,
    announced: bool,
}

impl<W: Write> Printer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            announced: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: std::fmt::Arguments<'_>) {
        if let Err(e) = writeln!(self.out, "{text}") {
            debug!(error = %e, "Console output failed");
        }
    }
}

impl<W: Write> RowObserver for Printer<W> {
    fn model_reset(&mut self, generation: Generation) {
        self.announced = false;
        self.line(format_args!("-- query {generation} --"));
    }

    fn rows_inserted(&mut self, first: usize, _last: usize, rows: &[ViewItem]) {
        for (offset, item) in rows.iter().enumerate() {
            let tags = item.tags.join(", ");
            self.line(format_args!(
                "{:>4}  {:<8} {}  [{}]",
                first + offset,
                item.category_icon,
                item.title,
                tags
            ));
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub struct Console<W> {
    view: ResultsView,
    filter: FilterCriteriaBuilder,
    launcher: Option<Launcher>,
    fusedir: PathBuf,
    printer: Printer<W>,
}

impl<W: Write> Console<W> {
    pub fn new(
        view: ResultsView,
        filter: FilterCriteriaBuilder,
        launcher: Option<Launcher>,
        fusedir: PathBuf,
        out: W,
    ) -> Self {
        Self {
            view,
            filter,
            launcher,
            fusedir,
            printer: Printer::new(out),
        }
    }

    pub fn view(&self) -> &ResultsView {
        &self.view
    }

    pub fn into_output(self) -> W {
        self.printer.into_inner()
    }

    /// Browse until `quit` or end of input.
    pub async fn run<R>(&mut self, input: R) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        let mut changes = self.filter.subscribe();

        self.view.refresh(None, &mut self.printer)?;

        loop {
            if self.view.can_fetch_more() {
                self.view.fetch_more();
            }
            self.announce_if_done();

            tokio::select! {
                biased;

                Some(completion) = self.view.next_completion() => {
                    self.view.dispatch(completion, &mut self.printer);
                    self.view.pump(&mut self.printer);
                }
                change = changes.recv() => match change {
                    Ok(criteria) => self.view.refresh(Some(criteria), &mut self.printer)?,
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "Coalescing filter changes");
                        let criteria = self.filter.criteria();
                        self.view.refresh(Some(criteria), &mut self.printer)?;
                    }
                    Err(RecvError::Closed) => bail!("filter change channel closed"),
                },
                line = lines.next_line() => {
                    let Some(line) = line.context("Failed to read command")? else {
                        break;
                    };
                    match self.command(&line) {
                        Ok(Flow::Quit) => break,
                        Ok(Flow::Continue) => {}
                        Err(e) => self.printer.line(format_args!("error: {e:#}")),
                    }
                }
            }
        }

        Ok(())
    }

    fn announce_if_done(&mut self) {
        let Some(model) = self.view.model() else {
            return;
        };
        if !self.printer.announced && model.queue().is_exhausted() && !model.is_loading() {
            let count = model.row_count();
            self.printer.announced = true;
            self.printer.line(format_args!("-- {count} results --"));
        }
    }

    fn command(&mut self, line: &str) -> Result<Flow> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(Flow::Continue);
        };
        let args: Vec<&str> = words.collect();

        match (name, args.as_slice()) {
            ("quit" | "q", []) => return Ok(Flow::Quit),
            ("filter", [index, key, value @ ..]) => {
                let index: usize = index.parse().context("rule index must be a number")?;
                if *key == "-" {
                    self.filter.set_key(index, None)?;
                } else {
                    self.filter.set_key(index, Some(key.to_string()))?;
                    if !value.is_empty() {
                        let value: CriterionValue = match value.join(" ").parse() {
                            Ok(value) => value,
                            Err(never) => match never {},
                        };
                        self.filter.set_value(index, value)?;
                    }
                }
            }
            ("sort", [key]) => {
                let key: SortKey = key.parse()?;
                self.view.set_sort_key(key, &mut self.printer)?;
            }
            ("open", [row]) => {
                let target = self.mount_path(row)?;
                let launcher = self
                    .launcher
                    .as_ref()
                    .ok_or_else(|| anyhow!("no opener available"))?;
                let pid = launcher.open(&target)?;
                self.printer.line(format_args!("opened {} (pid {pid})", target.display()));
            }
            ("url", [row]) => {
                let target = self.mount_path(row)?;
                let url = mount::file_url(&target);
                self.printer.line(format_args!("{url}"));
            }
            ("rules", []) => self.print_rules()?,
            _ => bail!("unknown command: {line}"),
        }

        Ok(Flow::Continue)
    }

    fn mount_path(&self, row: &str) -> Result<PathBuf> {
        let row: usize = row.parse().context("row must be a number")?;
        let item = self
            .view
            .item(row)
            .ok_or_else(|| anyhow!("no row {row}"))?;
        let record = self
            .view
            .store()
            .get_record(&item.asset)?
            .ok_or_else(|| anyhow!("{} is no longer in the database", item.asset))?;
        Ok(mount::fuse_path(&self.fusedir, &record)?)
    }

    fn print_rules(&mut self) -> Result<()> {
        let rules = self.filter.rules().to_vec();
        for (index, rule) in rules.iter().enumerate() {
            match &rule.key {
                Some(key) => self.printer.line(format_args!("{index}: {key} = {}", rule.value)),
                None => self.printer.line(format_args!("{index}: -")),
            }
        }

        match self.filter.keys() {
            Ok(keys) => {
                let keys: Vec<String> = keys
                    .into_iter()
                    .map(|(key, count)| format!("{key}({count})"))
                    .collect();
                self.printer.line(format_args!("keys: {}", keys.join(" ")));
            }
            Err(e) => warn!(error = %e, "Failed to list keys"),
        }
        Ok(())
    }
}
