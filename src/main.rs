fn main() -> anyhow::Result<()> {
    shaderir::driver::main()
}
