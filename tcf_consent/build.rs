//! Turns every decision file under `tests/data` into a `test_case` of `tests/decisions.rs`.
use proc_macro2::TokenStream;
use quote::quote;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::{env, fs};
use walkdir::WalkDir;

const TEST_DATA_DIR: &str = "tests/data";
const GENERATED_FILE: &str = "decision_tests.rs";

struct DecisionFile {
    path: String,
    name: String,
}

impl DecisionFile {
    fn from_path(path: &Path) -> Option<Self> {
        if path.extension()? != "json" {
            return None;
        }

        Some(Self {
            path: path.to_str()?.to_string(),
            name: path.file_stem()?.to_str()?.replace(['-', '.', ' '], "_"),
        })
    }

    fn to_attribute(&self) -> TokenStream {
        let (path, name) = (&self.path, &self.name);
        quote! {
            #[test_case(#path ; #name)]
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let data_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?).join(TEST_DATA_DIR);
    println!("cargo::rerun-if-changed={}", data_dir.display());

    let files = decision_files(&data_dir)?;
    let dest = Path::new(&env::var("OUT_DIR")?).join(GENERATED_FILE);
    fs::write(dest, render(&files)?)?;

    Ok(())
}

fn decision_files(dir: &Path) -> Result<Vec<DecisionFile>, walkdir::Error> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.extend(DecisionFile::from_path(entry.path()));
        }
    }

    Ok(files)
}

fn render(files: &[DecisionFile]) -> syn::Result<String> {
    let attributes = files.iter().map(DecisionFile::to_attribute);
    let tokens = quote! {
        use test_case::test_case;
        #(#attributes)*
        fn decisions(path: &str) {
            let case = crate::common::TestCase::load_from_file(path)
                .unwrap_or_else(|e| panic!("{path}: {e}"));
            case.assert_decisions_match();
        }
    };

    Ok(prettyplease::unparse(&syn::parse2(tokens)?))
}
