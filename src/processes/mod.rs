pub mod paf_annotate;
