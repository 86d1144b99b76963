fn main() {
    medreminder_lib::run()
}
