//! Bundled interpreted scripts and the packages they import.
//!
//! Two scanners live here. [`scan`] reports that a script of a given language
//! ships with the plugin at all, and does so even when the language runs
//! everywhere. [`scan_imports`] reports third-party packages a Python or
//! JavaScript script imports, since those have to be installed on the host.

use std::{collections::HashSet, path::Path, sync::LazyLock};

use {regex::Regex, tracing::debug};

use crate::{
    bundle::{BundleFile, PluginBundle},
    evidence::{Evidence, EvidenceSource},
    scan::compile,
    verdict::ImpactVector,
};

/// Import syntax a script kind uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImportSyntax {
    Python,
    JavaScript,
    Unsupported,
}

struct ScriptKind {
    extensions: &'static [&'static str],
    language: &'static str,
    detail: &'static str,
    impact: ImpactVector,
    imports: ImportSyntax,
}

const SCRIPT_KINDS: &[ScriptKind] = &[
    ScriptKind {
        extensions: &["py"],
        language: "python",
        detail: "Python script needs a python interpreter on the host",
        impact: ImpactVector::DESKTOP_REVIEW,
        imports: ImportSyntax::Python,
    },
    ScriptKind {
        extensions: &["sh", "bash", "zsh"],
        language: "shell",
        detail: "shell script needs a POSIX shell on the host",
        impact: ImpactVector::DESKTOP_REVIEW,
        imports: ImportSyntax::Unsupported,
    },
    ScriptKind {
        extensions: &["js", "mjs", "cjs"],
        language: "node",
        detail: "JavaScript runs on the bundled Node runtime",
        impact: ImpactVector::COMPATIBLE,
        imports: ImportSyntax::JavaScript,
    },
    ScriptKind {
        extensions: &["ts", "mts"],
        language: "typescript",
        detail: "TypeScript needs a compiler or a TypeScript-aware runtime",
        impact: ImpactVector::DESKTOP_REVIEW,
        imports: ImportSyntax::JavaScript,
    },
    ScriptKind {
        extensions: &["rb"],
        language: "ruby",
        detail: "Ruby script needs a ruby interpreter",
        impact: ImpactVector::DESKTOP_INCOMPATIBLE,
        imports: ImportSyntax::Unsupported,
    },
    ScriptKind {
        extensions: &["pl"],
        language: "perl",
        detail: "Perl script needs a perl interpreter",
        impact: ImpactVector::DESKTOP_INCOMPATIBLE,
        imports: ImportSyntax::Unsupported,
    },
    ScriptKind {
        extensions: &["ps1"],
        language: "powershell",
        detail: "PowerShell script needs a PowerShell host",
        impact: ImpactVector::DESKTOP_INCOMPATIBLE,
        imports: ImportSyntax::Unsupported,
    },
];

// Both lists are sorted; lookups use binary search.
const PYTHON_STDLIB: &[&str] = &[
    "__future__", "abc", "argparse", "array", "ast", "asyncio", "base64", "binascii", "bisect",
    "builtins", "bz2", "calendar", "cmath", "codecs", "collections", "colorsys", "concurrent",
    "configparser", "contextlib", "contextvars", "copy", "csv", "ctypes", "dataclasses", "datetime",
    "decimal", "difflib", "dis", "email", "encodings", "enum", "errno", "faulthandler", "fcntl",
    "filecmp", "fileinput", "fnmatch", "fractions", "ftplib", "functools", "gc", "getopt",
    "getpass", "gettext", "glob", "graphlib", "grp", "gzip", "hashlib", "heapq", "hmac", "html",
    "http", "imaplib", "importlib", "inspect", "io", "ipaddress", "itertools", "json", "keyword",
    "linecache", "locale", "logging", "lzma", "mailbox", "marshal", "math", "mimetypes", "mmap",
    "multiprocessing", "netrc", "numbers", "operator", "optparse", "os", "pathlib", "pdb", "pickle",
    "pkgutil", "platform", "plistlib", "poplib", "posixpath", "pprint", "profile", "pstats", "pty",
    "pwd", "py_compile", "queue", "quopri", "random", "re", "readline", "reprlib", "resource",
    "rlcompleter", "runpy", "sched", "secrets", "select", "selectors", "shelve", "shlex", "shutil",
    "signal", "site", "smtplib", "socket", "socketserver", "sqlite3", "ssl", "stat", "statistics",
    "string", "stringprep", "struct", "subprocess", "symtable", "sys", "sysconfig", "syslog",
    "tabnanny", "tarfile", "tempfile", "termios", "textwrap", "threading", "time", "timeit",
    "tkinter", "token", "tokenize", "tomllib", "trace", "traceback", "tracemalloc", "tty", "turtle",
    "types", "typing", "unicodedata", "unittest", "urllib", "uuid", "venv", "warnings", "wave",
    "weakref", "webbrowser", "winreg", "wsgiref", "xml", "xmlrpc", "zipapp", "zipfile", "zipimport",
    "zlib", "zoneinfo",
];

const NODE_BUILTINS: &[&str] = &[
    "assert", "async_hooks", "buffer", "child_process", "cluster", "console", "constants", "crypto",
    "dgram", "diagnostics_channel", "dns", "domain", "events", "fs", "http", "http2", "https",
    "inspector", "module", "net", "os", "path", "perf_hooks", "process", "punycode", "querystring",
    "readline", "repl", "stream", "string_decoder", "sys", "timers", "tls", "trace_events", "tty",
    "url", "util", "v8", "vm", "wasi", "worker_threads", "zlib",
];

static PY_IMPORT: LazyLock<Option<Regex>> =
    LazyLock::new(|| compile(r"^\s*import\s+([A-Za-z_][\w.]*(?:\s+as\s+\w+)?(?:\s*,\s*[A-Za-z_][\w.]*(?:\s+as\s+\w+)?)*)"));
static PY_FROM: LazyLock<Option<Regex>> =
    LazyLock::new(|| compile(r"^\s*from\s+([A-Za-z_][\w.]*)\s+import\b"));
static JS_IMPORTS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#"\brequire\s*\(\s*['"]([^'"]+)['"]\s*\)"#,
        r#"\bfrom\s+['"]([^'"]+)['"]"#,
        r#"^\s*import\s+['"]([^'"]+)['"]"#,
        r#"\bimport\s*\(\s*['"]([^'"]+)['"]\s*\)"#,
    ]
    .into_iter()
    .filter_map(compile)
    .collect()
});

fn script_kind(path: &Path) -> Option<&'static ScriptKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    SCRIPT_KINDS
        .iter()
        .find(|kind| kind.extensions.contains(&ext.as_str()))
}

/// Whether the path has a recognized script extension.
pub fn is_script(path: &Path) -> bool {
    script_kind(path).is_some()
}

/// One presence evidence per bundled script, in listing order.
pub fn scan(files: &[BundleFile]) -> Vec<Evidence> {
    files
        .iter()
        .filter_map(|file| {
            let kind = script_kind(&file.path)?;
            Some(Evidence::new(
                EvidenceSource::Script,
                &file.path,
                format!("script: {}", kind.language),
                kind.detail,
                kind.impact,
            ))
        })
        .collect()
}

pub fn scan_bundle(bundle: &PluginBundle) -> Vec<Evidence> {
    scan(&bundle.files)
}

/// Third-party imports of one script.
///
/// Standard-library modules, relative imports and `local_modules` (modules
/// shipped in the plugin itself) are ignored. Each package is reported once
/// per file, at its first import.
pub fn scan_imports(contents: &str, path: &Path, local_modules: &HashSet<String>) -> Vec<Evidence> {
    let Some(kind) = script_kind(path) else {
        return Vec::new();
    };

    let extract: fn(&str) -> Vec<String> = match kind.imports {
        ImportSyntax::Python => python_packages,
        ImportSyntax::JavaScript => node_packages,
        ImportSyntax::Unsupported => return Vec::new(),
    };
    let is_external = |package: &String| match kind.imports {
        ImportSyntax::Python => !is_python_stdlib(package) && !local_modules.contains(package),
        _ => !is_node_builtin(package),
    };

    let mut seen = HashSet::new();
    let mut evidence = Vec::new();
    for (idx, line) in contents.lines().enumerate() {
        for package in extract(line) {
            if !is_external(&package) || !seen.insert(package.clone()) {
                continue;
            }
            evidence.push(import_evidence(kind.imports, package, path).at_line(idx + 1));
        }
    }
    evidence
}

/// Imports of every bundled script whose contents were read.
pub fn scan_imports_bundle(bundle: &PluginBundle) -> Vec<Evidence> {
    let local = local_modules(&bundle.files);
    bundle
        .files
        .iter()
        .filter_map(|file| {
            let contents = file.contents.as_deref()?;
            Some(scan_imports(contents, &file.path, &local))
        })
        .flatten()
        .collect()
}

fn import_evidence(syntax: ImportSyntax, package: String, path: &Path) -> Evidence {
    let (prefix, ecosystem) = match syntax {
        ImportSyntax::Python => ("python-import", "Python"),
        _ => ("node-import", "npm"),
    };
    Evidence::new(
        EvidenceSource::ScriptImport,
        path,
        format!("{prefix}: {package}"),
        format!("imports third-party {ecosystem} package `{package}`, which must be installed"),
        ImpactVector::DESKTOP_INCOMPATIBLE,
    )
}

/// Module names the plugin ships: Python file stems and the directories
/// that directly hold Python files (packages).
fn local_modules(files: &[BundleFile]) -> HashSet<String> {
    let mut local = HashSet::new();
    for file in files.iter().filter(|f| f.extension() == Some("py")) {
        if let Some(stem) = file.path.file_stem().and_then(|s| s.to_str()) {
            local.insert(stem.to_string());
        }
        if let Some(package) = file
            .path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
        {
            local.insert(package.to_string());
        }
    }
    debug!(count = local.len(), "local python modules");
    local
}

fn python_packages(line: &str) -> Vec<String> {
    let line = line.split('#').next().unwrap_or_default();
    if let Some(caps) = PY_FROM.as_ref().and_then(|re| re.captures(line)) {
        return top_level(&caps[1]).into_iter().collect();
    }
    let Some(caps) = PY_IMPORT.as_ref().and_then(|re| re.captures(line)) else {
        return Vec::new();
    };
    caps[1]
        .split(',')
        .filter_map(|item| item.split_whitespace().next())
        .filter_map(top_level)
        .collect()
}

fn top_level(module: &str) -> Option<String> {
    let first = module.split('.').next()?;
    (!first.is_empty()).then(|| first.to_string())
}

fn node_packages(line: &str) -> Vec<String> {
    let mut out = Vec::new();
    for re in JS_IMPORTS.iter() {
        for caps in re.captures_iter(line) {
            if let Some(package) = node_package_name(&caps[1])
                && !out.contains(&package)
            {
                out.push(package);
            }
        }
    }
    out
}

/// npm package name of a module specifier, `None` for relative, absolute
/// and `node:` specifiers.
fn node_package_name(specifier: &str) -> Option<String> {
    let specifier = specifier.trim();
    if specifier.is_empty()
        || specifier.starts_with('.')
        || specifier.starts_with('/')
        || specifier.starts_with("node:")
    {
        return None;
    }
    let mut parts = specifier.split('/');
    let first = parts.next()?;
    if first.starts_with('@') {
        let second = parts.next().filter(|s| !s.is_empty())?;
        Some(format!("{first}/{second}"))
    } else {
        Some(first.to_string())
    }
}

fn is_python_stdlib(module: &str) -> bool {
    PYTHON_STDLIB.binary_search(&module).is_ok()
}

fn is_node_builtin(package: &str) -> bool {
    NODE_BUILTINS.binary_search(&package).is_ok()
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {rstest::rstest, std::path::PathBuf};

    use super::*;

    fn file(path: &str, contents: Option<&str>) -> BundleFile {
        BundleFile {
            path: PathBuf::from(path),
            contents: contents.map(str::to_string),
        }
    }

    fn signals(ev: &[Evidence]) -> Vec<&str> {
        ev.iter().map(|e| e.signal.as_str()).collect()
    }

    #[test]
    fn builtin_lists_are_sorted() {
        assert!(PYTHON_STDLIB.windows(2).all(|w| w[0] < w[1]));
        assert!(NODE_BUILTINS.windows(2).all(|w| w[0] < w[1]));
    }

    #[rstest]
    #[case("scripts/run.py", true)]
    #[case("scripts/setup.SH", true)]
    #[case("server/index.mjs", true)]
    #[case("tools/x.ps1", true)]
    #[case("README.md", false)]
    #[case("Makefile", false)]
    #[case("data.json", false)]
    fn recognizes_script_extensions(#[case] path: &str, #[case] expected: bool) {
        assert_eq!(is_script(Path::new(path)), expected);
    }

    #[test]
    fn presence_is_reported_even_when_compatible() {
        let files = [
            file("README.md", None),
            file("scripts/a.py", None),
            file("server/index.js", None),
            file("scripts/b.rb", None),
        ];
        let ev = scan(&files);
        assert_eq!(signals(&ev), ["script: python", "script: node", "script: ruby"]);
        assert_eq!(ev[1].impact, ImpactVector::COMPATIBLE);
        assert_eq!(ev[2].impact, ImpactVector::DESKTOP_INCOMPATIBLE);
        assert!(ev.iter().all(|e| e.line.is_none()));
    }

    #[test]
    fn python_imports() {
        let src = "\
#!/usr/bin/env python3
import os, sys
import requests
from yaml import safe_load
from . import sibling
from .util import helper
import numpy.linalg as la, json
from collections import OrderedDict
import helpers  # shipped alongside
import requests
";
        let local = HashSet::from(["helpers".to_string()]);
        let ev = scan_imports(src, Path::new("scripts/fetch.py"), &local);
        assert_eq!(signals(&ev), [
            "python-import: requests",
            "python-import: yaml",
            "python-import: numpy",
        ]);
        assert_eq!(ev[0].line, Some(3));
        assert_eq!(ev[2].line, Some(7));
        assert!(ev.iter().all(|e| e.impact == ImpactVector::DESKTOP_INCOMPATIBLE));
        assert!(ev.iter().all(|e| e.source == EvidenceSource::ScriptImport));
    }

    #[test]
    fn node_imports() {
        let src = r#"
const fs = require('fs');
const path = require("node:path");
const lib = require('./lib');
import express from 'express';
import { z } from "zod/v4";
import '@scope/polyfill/auto';
import type { Foo } from "../types";
const chalk = await import('chalk');
const again = require('express');
"#;
        let ev = scan_imports(src, Path::new("server/index.ts"), &HashSet::new());
        assert_eq!(signals(&ev), [
            "node-import: express",
            "node-import: zod",
            "node-import: @scope/polyfill",
            "node-import: chalk",
        ]);
        assert_eq!(ev[0].line, Some(5));
    }

    #[test]
    fn shell_scripts_have_no_imports() {
        let ev = scan_imports("source ./env.sh\nimport foo", Path::new("x.sh"), &HashSet::new());
        assert!(ev.is_empty());
    }

    #[rstest]
    #[case("lodash/fp", Some("lodash"))]
    #[case("@anthropic-ai/sdk", Some("@anthropic-ai/sdk"))]
    #[case("@scope", None)]
    #[case("./local", None)]
    #[case("/abs/path", None)]
    #[case("node:fs", None)]
    fn package_names(#[case] spec: &str, #[case] expected: Option<&str>) {
        assert_eq!(node_package_name(spec).as_deref(), expected);
    }

    #[test]
    fn bundle_imports_skip_shipped_modules() {
        let bundle = PluginBundle {
            files: vec![
                file("scripts/main.py", Some("import shared\nimport httpx\nfrom lib import x\n")),
                file("scripts/shared.py", Some("import os\n")),
                file("scripts/lib/__init__.py", Some("")),
                file("scripts/big.py", None),
            ],
            ..PluginBundle::default()
        };
        let ev = scan_imports_bundle(&bundle);
        assert_eq!(signals(&ev), ["python-import: httpx"]);
        assert_eq!(ev[0].file, PathBuf::from("scripts/main.py"));
    }

    #[test]
    fn non_python_directories_do_not_shadow_packages() {
        let bundle = PluginBundle {
            files: vec![
                file("skills/pandas/SKILL.md", None),
                file("scripts/etl.py", Some("import pandas as pd\n")),
            ],
            ..PluginBundle::default()
        };
        let ev = scan_imports_bundle(&bundle);
        assert_eq!(signals(&ev), ["python-import: pandas"]);
    }
}
