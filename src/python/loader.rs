//! Package discovery and dotted-path resolution.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, warn};

use super::error::LoadError;
use super::model::{Object, ObjectKind, dotted};
use super::parse::{ModuleFile, parse_module};

/// Maximum number of alias hops followed while resolving one path.
const MAX_ALIAS_DEPTH: usize = 32;

/// Locates packages on a list of directories, like `sys.path`.
#[derive(Debug, Clone, Default)]
pub struct Loader {
	search_paths: Vec<PathBuf>,
}

/// A fully loaded package tree.
#[derive(Debug, Clone)]
pub struct Package {
	/// Top-level package name.
	pub name: String,
	/// Search path directory the package was found in.
	pub search_path: PathBuf,
	/// Root module object.
	pub root: Object,
}

impl Loader {
	/// Create a loader over the given search paths, searched in order.
	pub fn new(search_paths: Vec<PathBuf>) -> Self {
		Self { search_paths }
	}

	/// Directories searched for packages.
	pub fn search_paths(&self) -> &[PathBuf] {
		&self.search_paths
	}

	/// Load `name` from the first search path that contains it.
	///
	/// Packages are parsed from disk on every call.
	pub fn load(&self, name: &str) -> Result<Package, LoadError> {
		for search_path in &self.search_paths {
			let package_dir = search_path.join(name);
			if package_dir.join("__init__.py").is_file() {
				debug!(package = name, path = %package_dir.display(), "loading package");
				let root = load_package_dir(search_path, &package_dir, name)?;
				return Ok(Package {
					name: name.to_string(),
					search_path: search_path.clone(),
					root,
				});
			}

			let module_file = search_path.join(format!("{name}.py"));
			if module_file.is_file() {
				debug!(package = name, path = %module_file.display(), "loading module");
				let root = load_module_file(search_path, &module_file, name, false)?;
				return Ok(Package {
					name: name.to_string(),
					search_path: search_path.clone(),
					root,
				});
			}
		}

		Err(LoadError::PackageNotFound { name: name.to_string() })
	}
}

/// Ask a Python interpreter for its `sys.path` entries that are existing directories.
pub fn interpreter_search_paths(interpreter: &str) -> Result<Vec<PathBuf>, LoadError> {
	let output = Command::new(interpreter)
		.args(["-c", "import sys; print('\\n'.join(sys.path))"])
		.stderr(Stdio::null())
		.output()
		.map_err(|e| LoadError::Interpreter {
			interpreter: interpreter.to_string(),
			message: e.to_string(),
		})?;

	if !output.status.success() {
		return Err(LoadError::Interpreter {
			interpreter: interpreter.to_string(),
			message: format!("exited with {}", output.status),
		});
	}

	let stdout = String::from_utf8_lossy(&output.stdout);
	Ok(stdout
		.lines()
		.map(str::trim)
		.filter(|line| !line.is_empty())
		.map(PathBuf::from)
		.filter(|path| path.is_dir())
		.collect())
}

fn read_source(path: &Path) -> Result<String, LoadError> {
	fs::read_to_string(path).map_err(|source| LoadError::Io {
		path: path.to_path_buf(),
		source,
	})
}

fn load_module_file(search_path: &Path, file: &Path, module_path: &str, is_package: bool) -> Result<Object, LoadError> {
	let source = read_source(file)?;
	let module_file = ModuleFile {
		module_path: module_path.to_string(),
		filepath: file.to_path_buf(),
		relative_filepath: file.strip_prefix(search_path).unwrap_or(file).to_path_buf(),
		is_package,
	};
	parse_module(&module_file, &source)
}

fn load_package_dir(search_path: &Path, dir: &Path, module_path: &str) -> Result<Object, LoadError> {
	let mut package = load_module_file(search_path, &dir.join("__init__.py"), module_path, true)?;

	let mut entries: Vec<PathBuf> = fs::read_dir(dir)
		.map_err(|source| LoadError::Io {
			path: dir.to_path_buf(),
			source,
		})?
		.filter_map(|entry| entry.ok().map(|e| e.path()))
		.collect();
	entries.sort();

	let mut submodules = Vec::new();
	for entry in entries {
		let Some(file_name) = entry.file_name().and_then(|n| n.to_str()) else {
			continue;
		};
		let loaded = if entry.is_dir() {
			if file_name == "__pycache__" || !entry.join("__init__.py").is_file() || !is_identifier(file_name) {
				continue;
			}
			load_package_dir(search_path, &entry, &dotted(module_path, file_name))
		} else if let Some(stem) = file_name.strip_suffix(".py") {
			if stem == "__init__" || !is_identifier(stem) {
				continue;
			}
			load_module_file(search_path, &entry, &dotted(module_path, stem), false)
		} else {
			continue;
		};

		match loaded {
			Ok(submodule) => submodules.push(submodule),
			Err(e) => warn!(package = module_path, path = %entry.display(), error = %e, "skipping submodule"),
		}
	}

	if let Some(members) = package.members_mut() {
		for submodule in submodules {
			match members.iter_mut().find(|m| m.name == submodule.name) {
				Some(existing) if existing.is_alias() => *existing = submodule,
				Some(_) => {}
				None => members.push(submodule),
			}
		}
	}
	Ok(package)
}

fn is_identifier(name: &str) -> bool {
	let mut chars = name.chars();
	chars.next().is_some_and(|c| c.is_alphabetic() || c == '_') && chars.all(|c| c.is_alphanumeric() || c == '_')
}

impl Package {
	/// Resolve a dotted path relative to the package root; empty paths yield the root.
	///
	/// Import aliases that point inside the package are followed transparently.
	pub fn get(&self, object_path: &str) -> Result<&Object, LoadError> {
		self.get_with_depth(object_path, 0)
	}

	fn get_with_depth(&self, object_path: &str, depth: usize) -> Result<&Object, LoadError> {
		if depth > MAX_ALIAS_DEPTH {
			return Err(LoadError::AliasCycle(dotted(&self.name, object_path)));
		}

		let mut current = &self.root;
		if object_path.is_empty() {
			return Ok(current);
		}

		for segment in object_path.split('.') {
			current = self.member_of(current, segment, depth)?;
		}
		Ok(current)
	}

	/// Direct member `segment` of `container`, or a name re-exported through `import *`.
	fn member_of<'a>(&'a self, container: &'a Object, segment: &str, depth: usize) -> Result<&'a Object, LoadError> {
		if container.members().is_none() {
			return Err(LoadError::NotAContainer {
				segment: segment.to_string(),
				parent: container.path.clone(),
			});
		}
		if let Some(member) = container.member(segment) {
			return self.follow_alias(member, depth);
		}

		if depth < MAX_ALIAS_DEPTH {
			for target in container.wildcards() {
				let Some(relative) = self.relative_path(target) else {
					debug!(module = %container.path, target = %target, "wildcard import outside package");
					continue;
				};
				let Ok(module) = self.get_with_depth(relative, depth + 1) else {
					continue;
				};
				if !module.exports_name(segment) {
					continue;
				}
				if let Ok(found) = self.member_of(module, segment, depth + 1) {
					debug!(module = %container.path, name = segment, source = %module.path, "resolved through wildcard import");
					return Ok(found);
				}
			}
		}

		Err(LoadError::ObjectNotFound {
			segment: segment.to_string(),
			parent: container.path.clone(),
		})
	}

	/// `target` relative to the package root, when it lies inside the package.
	fn relative_path<'t>(&self, target: &'t str) -> Option<&'t str> {
		if target == self.name {
			return Some("");
		}
		target.strip_prefix(self.name.as_str())?.strip_prefix('.')
	}

	fn follow_alias<'a>(&'a self, obj: &'a Object, depth: usize) -> Result<&'a Object, LoadError> {
		let ObjectKind::Alias { target_path } = &obj.kind else {
			return Ok(obj);
		};
		debug!(alias = %obj.path, target = %target_path, "following alias");

		let relative = self.relative_path(target_path).ok_or_else(|| LoadError::AliasOutsidePackage {
			alias: obj.path.clone(),
			target: target_path.clone(),
			package: self.name.clone(),
		})?;
		self.get_with_depth(relative, depth + 1)
	}
}

/// Split `pkg.sub.Obj` into (`pkg`, `sub.Obj`).
pub fn split_module_path(module_path: &str) -> (&str, &str) {
	module_path.split_once('.').unwrap_or((module_path, ""))
}

/// Dotted prefix of the object's parent: the full path with its last segment dropped.
pub fn parent_prefix(package_name: &str, object_path: &str) -> String {
	let full = format!("{package_name}.{object_path}");
	let segments: Vec<&str> = full.split('.').collect();
	segments[..segments.len() - 1].join(".")
}

#[cfg(test)]
mod tests {
	use super::*;

	fn write(dir: &Path, rel: &str, content: &str) {
		let path = dir.join(rel);
		fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
		fs::write(path, content).expect("write");
	}

	fn fixture() -> tempfile::TempDir {
		let dir = tempfile::tempdir().expect("tempdir");
		write(dir.path(), "demo/__init__.py", "\"\"\"Demo package.\"\"\"\nfrom .core import Foo\nfrom .core import missing as gone\nfrom os import path\n");
		write(dir.path(), "demo/core.py", "class Foo:\n    \"\"\"A foo.\"\"\"\n\n    def run(self):\n        pass\n");
		write(dir.path(), "demo/sub/__init__.py", "");
		write(dir.path(), "demo/sub/deep.py", "VALUE = 1\n");
		write(dir.path(), "demo/__pycache__/core.cpython-312.pyc", "");
		write(dir.path(), "single.py", "def f():\n    \"\"\"F.\"\"\"\n");
		dir
	}

	#[test]
	fn loads_package_tree_with_submodules() {
		let dir = fixture();
		let loader = Loader::new(vec![dir.path().to_path_buf()]);
		let package = loader.load("demo").expect("load");

		assert_eq!(package.root.docstring.as_ref().map(|d| d.value.as_str()), Some("Demo package."));
		assert_eq!(package.get("sub.deep.VALUE").expect("value").path, "demo.sub.deep.VALUE");
		assert_eq!(package.get("core").expect("core").location.relative_filepath, PathBuf::from("demo/core.py"));
		assert!(package.root.member("__pycache__").is_none());
		assert_eq!(package.get("").expect("root").path, "demo");
	}

	#[test]
	fn follows_in_package_aliases() {
		let dir = fixture();
		let package = Loader::new(vec![dir.path().to_path_buf()]).load("demo").expect("load");
		let foo = package.get("Foo").expect("alias");
		assert_eq!(foo.path, "demo.core.Foo");
		assert_eq!(package.get("Foo.run").expect("method").path, "demo.core.Foo.run");
	}

	#[test]
	fn reports_lookup_failures() {
		let dir = fixture();
		let loader = Loader::new(vec![dir.path().to_path_buf()]);
		let package = loader.load("demo").expect("load");

		let err = package.get("core.Bar").unwrap_err();
		assert_eq!(err.to_string(), "'Bar' not found in 'demo.core'");
		assert!(matches!(package.get("gone"), Err(LoadError::ObjectNotFound { .. })));
		assert!(matches!(package.get("path"), Err(LoadError::AliasOutsidePackage { .. })));
		assert!(matches!(package.get("sub.deep.VALUE.x"), Err(LoadError::NotAContainer { .. })));

		let err = loader.load("nonexistent").unwrap_err();
		assert_eq!(err.to_string(), "No module named 'nonexistent'");
	}

	#[test]
	fn wildcard_imports_expose_public_names() {
		let dir = tempfile::tempdir().expect("tempdir");
		write(dir.path(), "pkg/__init__.py", "from .core import *\nfrom .limited import *\nfrom os.path import *\n");
		write(dir.path(), "pkg/core.py", "class Foo:\n    pass\n\ndef _hidden():\n    pass\n");
		write(dir.path(), "pkg/limited.py", "__all__ = ['exported']\n\ndef exported():\n    pass\n\ndef unlisted():\n    pass\n");
		let package = Loader::new(vec![dir.path().to_path_buf()]).load("pkg").expect("load");

		assert_eq!(package.get("Foo").expect("wildcard").path, "pkg.core.Foo");
		assert_eq!(package.get("exported").expect("listed").path, "pkg.limited.exported");
		assert!(matches!(package.get("_hidden"), Err(LoadError::ObjectNotFound { .. })));
		assert!(matches!(package.get("unlisted"), Err(LoadError::ObjectNotFound { .. })));
	}

	#[test]
	fn wildcard_cycles_terminate() {
		let dir = tempfile::tempdir().expect("tempdir");
		write(dir.path(), "loop/__init__.py", "");
		write(dir.path(), "loop/a.py", "from .b import *\n");
		write(dir.path(), "loop/b.py", "from .a import *\n");
		let package = Loader::new(vec![dir.path().to_path_buf()]).load("loop").expect("load");
		assert!(package.get("a.missing").is_err());
	}

	#[test]
	fn unreadable_submodules_are_skipped() {
		let dir = fixture();
		let legacy = dir.path().join("demo/legacy.py");
		fs::write(&legacy, b"# -*- coding: latin-1 -*-\nNAME = '\xe9t\xe9'\n").expect("write");
		let package = Loader::new(vec![dir.path().to_path_buf()]).load("demo").expect("siblings still load");
		assert_eq!(package.get("Foo").expect("alias").path, "demo.core.Foo");
		assert!(package.root.member("legacy").is_none());

		fs::write(dir.path().join("demo/__init__.py"), b"X = '\xff'\n").expect("write");
		let err = Loader::new(vec![dir.path().to_path_buf()]).load("demo").unwrap_err();
		assert!(matches!(err, LoadError::Io { .. }));
	}

	#[test]
	fn loads_single_file_modules() {
		let dir = fixture();
		let package = Loader::new(vec![dir.path().to_path_buf()]).load("single").expect("load");
		assert!(matches!(package.root.kind, ObjectKind::Module { is_package: false, .. }));
		assert_eq!(package.get("f").expect("f").docstring.as_ref().map(|d| d.value.as_str()), Some("F."));
	}

	#[test]
	fn splits_paths() {
		assert_eq!(split_module_path("pkg.sub.Obj"), ("pkg", "sub.Obj"));
		assert_eq!(split_module_path("pkg"), ("pkg", ""));
		assert_eq!(parent_prefix("pkg", "sub.Obj"), "pkg.sub");
		assert_eq!(parent_prefix("pkg", ""), "pkg");
	}
}
