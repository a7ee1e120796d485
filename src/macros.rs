#[macro_export]
macro_rules! frequencies {
    ($slice:expr) => {{
        use $crate::alphabets::FreqVector;
        FreqVector::from_column_slice($slice)
    }};
}

#[macro_export]
macro_rules! record_wo_desc {
    ($e1:expr,$e2:expr) => {{
        use bio::io::fasta::Record;
        Record::with_attrs($e1, None, $e2)
    }};
}

#[macro_export]
macro_rules! tree {
    ($e:expr) => {{
        use $crate::tree::tree_parser::from_newick;
        from_newick($e).unwrap().pop().unwrap()
    }};
}
